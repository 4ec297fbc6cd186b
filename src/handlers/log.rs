//! `log`: emit `message` to the operator log at INFO.

use crate::Result;

pub fn log(message: &str) -> Result<()> {
    tracing::info!(target: "pseudoflow::step", "[log] {message}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_fails() {
        assert!(log("hi").is_ok());
    }
}
