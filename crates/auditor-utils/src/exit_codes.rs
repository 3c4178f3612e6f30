/// CLI process exit codes. Mirrors `AuditError::to_exit_code`, kept as a
/// separate small table so the CLI crate does not need to match on every
/// `AuditError` variant directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const OK: ExitCode = ExitCode(0);
    pub const GENERAL_ERROR: ExitCode = ExitCode(1);
    pub const CONFIG_ERROR: ExitCode = ExitCode(2);
    pub const VALIDATION_ERROR: ExitCode = ExitCode(4);
    pub const SSOT_VIOLATION: ExitCode = ExitCode(5);
    pub const CIRCUIT_OPEN: ExitCode = ExitCode(6);
    pub const CONTRACT_ERROR: ExitCode = ExitCode(7);
    pub const UPSTREAM_RETRYABLE: ExitCode = ExitCode(8);
    pub const UPSTREAM_CLIENT: ExitCode = ExitCode(9);
    pub const IO_ERROR: ExitCode = ExitCode(74);

    #[must_use]
    pub fn as_i32(self) -> i32 {
        self.0
    }
}
