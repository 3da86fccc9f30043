// Cancellation is cooperative: probes and cycles check the token before they
// start, and anything already past that check runs to completion.
pub use tokio_util::sync::CancellationToken;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let token = CancellationToken::new();
        let shared = token.clone();
        assert!(!shared.is_cancelled());
        token.cancel();
        assert!(shared.is_cancelled());
    }

    #[test]
    fn cancelled_wakes_waiter_after_cancel() {
        let token = CancellationToken::new();
        let waiter = token.clone();
        crate::testing::run_future(async move {
            let wait = tokio::spawn(async move { waiter.cancelled().await });
            tokio::task::yield_now().await;
            token.cancel();
            tokio::time::timeout(std::time::Duration::from_millis(50), wait)
                .await
                .expect("woken without polling delay")
                .expect("join");
        });
    }
}
