use thiserror::Error;

/// Failures that terminate a single verification run.
///
/// A proposal either fully normalizes, encodes and hashes, or the run fails
/// with one of these. Nothing is ever downgraded to a default value: a
/// substituted default would produce a digest that can never match the value
/// the module contract computes.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// No recognized proposal shape matched the source data.
    #[error("unrecognized proposal format: {0}")]
    UnrecognizedProposalFormat(String),

    /// The source data carries a plugin envelope, but none of the plugin
    /// names we know how to interpret is present.
    #[error("proposal envelope has no known plugin section (tried {})", .tried.join(", "))]
    UnknownPluginSection { tried: Vec<String> },

    /// A transaction field does not fit the fixed width the batch encoding
    /// assigns to it. Well-formed source data can never trigger this.
    #[error("`{field}` exceeds its fixed width in group {group}: {detail}")]
    EncodingOverflow {
        field: &'static str,
        group: usize,
        detail: String,
    },

    /// The Safe reports a contract-suite version we have no MultiSend
    /// deployment for on the given chain.
    #[error("unsupported contract-suite version `{version}` on chain {chain_id}")]
    UnsupportedContractVersion { version: String, chain_id: u64 },

    /// The hash oracle or a metadata lookup was unreachable or returned
    /// malformed data.
    #[error("external call `{stage}` failed: {reason}")]
    ExternalCallFailure {
        stage: &'static str,
        reason: String,
    },
}

impl VerifyError {
    pub(crate) fn format(detail: impl Into<String>) -> Self {
        Self::UnrecognizedProposalFormat(detail.into())
    }

    pub(crate) fn external(stage: &'static str, reason: impl ToString) -> Self {
        Self::ExternalCallFailure {
            stage,
            reason: reason.to_string(),
        }
    }
}
