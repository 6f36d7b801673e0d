use crate::{Result, Verdict};

/// Display side of a request: gets either a verdict or an error message.
pub trait Presenter {
    fn show_verdict(&mut self, verdict: &Verdict);
    fn show_error(&mut self, message: &str);
}

/// Request boundary: hand the outcome to the presenter. Returns `true` on success.
pub fn present<R: Presenter + ?Sized>(outcome: Result<Verdict>, presenter: &mut R) -> bool {
    match outcome {
        Ok(verdict) => {
            presenter.show_verdict(&verdict);
            true
        }
        Err(e) => {
            log::error!("{e}");
            presenter.show_error(&e.user_message());
            false
        }
    }
}
