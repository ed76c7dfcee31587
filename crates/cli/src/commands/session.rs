//! Login and logout.

use secrecy::SecretString;
use template_shop_storefront::state::AppState;

use super::CommandError;
use crate::output::print_block;

/// Environment variable read before prompting for the password.
pub const PASSWORD_ENV_VAR: &str = "SHOP_PASSWORD";

/// Read the password from `SHOP_PASSWORD` or an interactive prompt.
fn read_password() -> Result<SecretString, CommandError> {
    if let Ok(password) = std::env::var(PASSWORD_ENV_VAR)
        && !password.is_empty()
    {
        return Ok(SecretString::from(password));
    }

    if !std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        return Err(CommandError::Password(format!(
            "set {PASSWORD_ENV_VAR} or run interactively"
        )));
    }
    let password = rpassword::prompt_password("Password: ")
        .map_err(|e| CommandError::Password(e.to_string()))?;
    if password.is_empty() {
        return Err(CommandError::Password("empty password".to_owned()));
    }
    Ok(SecretString::from(password))
}

pub async fn login(state: &AppState, email: &str) -> Result<(), CommandError> {
    let password = read_password()?;
    let response = state.auth().login(email, &password).await?;
    let who = response
        .user
        .as_ref()
        .and_then(|u| u.get("name"))
        .and_then(serde_json::Value::as_str)
        .unwrap_or(email);
    print_block(&format!("Logged in as {who}"));
    Ok(())
}

pub async fn logout(state: &AppState) -> Result<(), CommandError> {
    state.auth().logout().await?;
    print_block("Logged out");
    Ok(())
}
