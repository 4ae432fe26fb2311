use stash_core::auth::{CredentialPersistence, Credentials};
use stash_core::Platform;

use crate::cli::AuthCommands;
use crate::credentials::{load_stored_credentials, KeyringCredentials};
use crate::error::CliError;

pub fn run_auth(command: AuthCommands) -> Result<(), CliError> {
    match command {
        AuthCommands::Set {
            platform,
            account,
            refresh_token,
            access_token,
        } => {
            let platform = Platform::from(platform);
            let credentials = Credentials::new(
                access_token.unwrap_or_default().trim(),
                refresh_token.trim(),
                account.trim(),
            );
            if !credentials.is_authenticated() {
                return Err(CliError::Auth(
                    "Both --account and --refresh-token must be non-empty".to_string(),
                ));
            }
            KeyringCredentials::new(platform).save(&credentials)?;
            println!("Stored {platform} credentials for account {}", credentials.account_id);
            Ok(())
        }
        AuthCommands::Status { platform } => {
            let platforms = platform.map_or_else(|| Platform::ALL.to_vec(), |p| vec![p.into()]);
            for platform in platforms {
                println!("{}", auth_status_line(platform)?);
            }
            Ok(())
        }
        AuthCommands::Logout { platform } => {
            let platform = Platform::from(platform);
            KeyringCredentials::new(platform).clear()?;
            println!("Removed {platform} credentials");
            Ok(())
        }
    }
}

pub fn auth_status_line(platform: Platform) -> Result<String, CliError> {
    let stored = load_stored_credentials(platform)?;
    Ok(match stored {
        Some(credentials) if credentials.is_authenticated() => {
            format!("{platform}: signed in as {}", credentials.account_id)
        }
        _ => format!("{platform}: not signed in"),
    })
}
