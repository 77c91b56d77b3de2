//! Startup readiness check for kernel conntrack accounting.
//!
//! Without `net.netfilter.nf_conntrack_acct = 1` the kernel reports no
//! `packets=`/`bytes=` counters, so every flow fails the thresholds and
//! reports stay empty. The check only warns; the daemon starts anyway.

use std::path::Path;

/// State of the conntrack accounting switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountingSwitch {
    /// The sysctl reads `1`.
    Enabled,
    /// The sysctl reads anything other than `1`.
    Disabled(String),
    /// The sysctl could not be read.
    Unknown(String),
}

/// Read the accounting sysctl and warn when it is not enabled.
pub async fn check_conntrack_accounting(path: &Path) -> AccountingSwitch {
    let switch = match tokio::fs::read_to_string(path).await {
        Ok(value) if value.trim() == "1" => AccountingSwitch::Enabled,
        Ok(value) => AccountingSwitch::Disabled(value.trim().to_owned()),
        Err(e) => AccountingSwitch::Unknown(e.to_string()),
    };

    match &switch {
        AccountingSwitch::Enabled => {
            tracing::debug!(path = %path.display(), "conntrack accounting enabled");
        }
        AccountingSwitch::Disabled(value) => {
            tracing::warn!(
                path = %path.display(),
                value = %value,
                "conntrack accounting is disabled; flows will carry no packet/byte counters \
                 (set net.netfilter.nf_conntrack_acct=1)"
            );
        }
        AccountingSwitch::Unknown(reason) => {
            tracing::warn!(
                path = %path.display(),
                reason = %reason,
                "unable to read conntrack accounting switch"
            );
        }
    }

    switch
}
