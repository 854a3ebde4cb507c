//! Principal store backed by the local Kerberos administration tool.
//!
//! One store call is one tool invocation: build the argv, run it under a
//! bounded deadline, and classify whatever lands on the error stream.
//! `kadmin.local` reports database errors through stderr while still exiting
//! zero, so stderr is the primary outcome signal; the exit status only
//! matters when stderr stays silent.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use kk_common::config::KadminConfig;
use kk_common::Credential;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{classify_change, classify_create, classify_delete};
use crate::{PrincipalStore, Result, StoreError};

/// Store that shells out to `kadmin.local` (or whatever tool path the config
/// points at).
pub struct KadminStore {
    tool: String,
    timeout: Duration,
}

/// Captured reaction of one tool run.
struct ToolRun {
    stderr: String,
    status: ExitStatus,
}

impl KadminStore {
    pub fn new(config: &KadminConfig) -> Self {
        Self {
            tool: config.path.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Credential flags shared by create and change_password: `-randkey`, or
    /// `-pw <password>` with the password verbatim.
    fn credential_args(credential: &Credential) -> Vec<String> {
        match credential {
            Credential::RandomKey => vec!["-randkey".to_string()],
            Credential::Password(password) => vec!["-pw".to_string(), password.clone()],
        }
    }

    /// Run one subcommand to completion and capture stderr plus exit status.
    ///
    /// The deadline covers the whole run; on expiry the child is killed
    /// (`kill_on_drop`) and the call reports [`StoreError::Timeout`] instead
    /// of blocking the caller forever.
    async fn run(&self, subcommand: &str, args: Vec<String>) -> Result<ToolRun> {
        debug!(tool = %self.tool, subcommand, "Invoking admin tool");

        let mut command = Command::new(&self.tool);
        command
            .arg(subcommand)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| {
                warn!(tool = %self.tool, subcommand, timeout = ?self.timeout, "Admin tool timed out");
                StoreError::Timeout {
                    target: self.tool.clone(),
                    timeout: self.timeout,
                }
            })?
            .map_err(|source| StoreError::Spawn {
                tool: self.tool.clone(),
                source,
            })?;

        Ok(ToolRun {
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            status: output.status,
        })
    }

    /// Guard for the silent-failure case: stderr empty but exit non-zero.
    fn check_exit(&self, subcommand: &str, status: ExitStatus) -> Result<()> {
        if status.success() {
            Ok(())
        } else {
            warn!(tool = %self.tool, subcommand, %status, "Admin tool exited non-zero with no diagnostic");
            Err(StoreError::Exit {
                tool: self.tool.clone(),
                status,
            })
        }
    }
}

#[async_trait]
impl PrincipalStore for KadminStore {
    fn backend(&self) -> &str {
        "kadmin"
    }

    async fn create(
        &self,
        principal: &str,
        credential: &Credential,
        attributes: Option<&str>,
    ) -> Result<()> {
        // add_principal [attributes] (-randkey | -pw <password>) <principal>
        // The attributes token goes first and the principal last, matching
        // what the tool expects.
        let mut args = Vec::new();
        if let Some(attributes) = attributes {
            args.push(attributes.to_string());
        }
        args.extend(Self::credential_args(credential));
        args.push(principal.to_string());

        let run = self.run("add_principal", args).await?;
        if !run.stderr.is_empty() {
            return Err(classify_create(principal, &run.stderr));
        }
        self.check_exit("add_principal", run.status)
    }

    async fn delete(&self, principal: &str) -> Result<()> {
        let run = self.run("delprinc", vec![principal.to_string()]).await?;
        if !run.stderr.is_empty() {
            return Err(classify_delete(principal, &run.stderr));
        }
        self.check_exit("delprinc", run.status)
    }

    async fn change_password(&self, principal: &str, credential: &Credential) -> Result<()> {
        // change_password (-randkey | -pw <password>) <principal> — attributes
        // never apply here.
        let mut args = Self::credential_args(credential);
        args.push(principal.to_string());

        let run = self.run("change_password", args).await?;
        if !run.stderr.is_empty() {
            return Err(classify_change(&run.stderr));
        }
        self.check_exit("change_password", run.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_args_select_random_key_or_explicit_password() {
        assert_eq!(
            KadminStore::credential_args(&Credential::RandomKey),
            vec!["-randkey"]
        );
        assert_eq!(
            KadminStore::credential_args(&Credential::Password("abc".into())),
            vec!["-pw", "abc"]
        );
    }
}
