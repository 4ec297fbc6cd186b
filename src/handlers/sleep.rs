//! `sleep`: suspend at least `seconds` wall-clock.

use crate::Result;
use std::time::Duration;

pub async fn sleep(seconds: u64) -> Result<()> {
    tokio::time::sleep(Duration::from_secs(seconds)).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sleeps_for_at_least_the_requested_duration() {
        let start = tokio::time::Instant::now();
        sleep(0).await.unwrap();
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
