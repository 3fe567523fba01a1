use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("`{command}` exited with status {exit_code}: {stderr}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("no `{field}` in ssh-config for machine `{machine}`")]
    MissingSshConfigField {
        machine: String,
        field: &'static str,
    },

    #[error("invalid port `{value}` in ssh-config for machine `{machine}`")]
    InvalidSshConfigPort { machine: String, value: String },

    #[error("invalid host string `{value}`: {reason}")]
    InvalidHostString { value: String, reason: String },

    #[error("command `{cmd}` on {target} exited with status {exit_code}: {stderr}")]
    NonZeroExit {
        target: String,
        cmd: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("machine `{0}` has no known SSH coordinates")]
    UnknownMachine(String),

    #[error("no address found for {0}")]
    Unresolvable(String),
}
