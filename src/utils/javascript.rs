use crate::core::BrowserTrait;
use crate::errors::{MarkerError, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

pub struct JavaScriptRunner;

impl JavaScriptRunner {
    pub async fn execute_with_timeout<B: BrowserTrait>(
        browser: &B,
        tab: &B::TabHandle,
        script: &str,
        timeout_ms: u64,
    ) -> Result<Value> {
        let execution = browser.execute_script(tab, script);

        tokio::time::timeout(tokio::time::Duration::from_millis(timeout_ms), execution)
            .await
            .map_err(|_| MarkerError::JavaScriptTimeout)?
    }

    /// Run a script that evaluates to a JSON string and decode it.
    pub async fn execute_json<B: BrowserTrait, T: DeserializeOwned>(
        browser: &B,
        tab: &B::TabHandle,
        script: &str,
        timeout_ms: u64,
    ) -> Result<T> {
        let result = Self::execute_with_timeout(browser, tab, script, timeout_ms).await?;
        let raw = Self::expect_string(result)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn expect_string(value: Value) -> Result<String> {
        match value {
            Value::String(raw) => Ok(raw),
            other => Err(MarkerError::JavaScriptFailed(format!(
                "expected a JSON string result, got {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_string_results_are_rejected() {
        assert_eq!(
            JavaScriptRunner::expect_string(Value::String("[]".to_string())).unwrap(),
            "[]"
        );
        let err = JavaScriptRunner::expect_string(Value::Null).unwrap_err();
        assert!(matches!(err, MarkerError::JavaScriptFailed(_)));
    }
}
