use crate::constants::ACCOUNT_ID_MAX_LEN;
use crate::errors::ValidationError;

/// Syntactic check of an account identifier. Whether the account is known is
/// decided by the settings store.
pub fn validate_account_id(account_id: &str) -> Result<(), ValidationError> {
    if account_id.trim().is_empty() {
        return Err(ValidationError::InvalidAccountId(
            "account id must not be empty".to_string(),
        ));
    }
    if account_id.len() > ACCOUNT_ID_MAX_LEN {
        return Err(ValidationError::InvalidAccountId(format!(
            "account id must be at most {} characters",
            ACCOUNT_ID_MAX_LEN
        )));
    }
    if let Some(c) = account_id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@')))
    {
        return Err(ValidationError::InvalidAccountId(format!(
            "unexpected character {:?} in account id",
            c
        )));
    }
    if account_id.chars().all(|c| c == '.') {
        return Err(ValidationError::InvalidAccountId(
            "account id must not consist only of dots".to_string(),
        ));
    }
    Ok(())
}
