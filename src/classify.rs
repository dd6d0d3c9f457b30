//! Turns protocol replies into the semantic errors callers branch on.
//!
//! Only the reply of the command that just ran is classified; errors that
//! already carry context (a failed dial, for instance) are passed through.

use crate::{
    error::Error,
    protocol::{Reply, StatusCode},
};

fn is_unavailable(reply: &Reply) -> bool {
    reply.code == StatusCode::FILE_UNAVAILABLE
}

/// Classifies an error from looking up a file.
pub fn file_error(err: Error, context: &str) -> Error {
    match err {
        Error::Status(ref reply) if is_unavailable(reply) => Error::ObjectNotFound,
        err => err.context(context),
    }
}

/// Classifies an error from looking up or removing a directory.
pub fn dir_error(err: Error, context: &str) -> Error {
    match err {
        Error::Status(ref reply) if is_unavailable(reply) => Error::DirNotFound,
        err => err.context(context),
    }
}

/// The server reports a download the client stopped reading early as an
/// aborted transfer. Such an error must not reach the caller.
pub fn is_benign_close(err: &Error) -> bool {
    matches!(
        err,
        Error::Status(reply)
            if reply.code == StatusCode::TRANSFER_ABORTED || is_unavailable(reply)
    )
}

#[cfg(test)]
mod test_classify {
    use super::*;

    fn status(code: u16) -> Error {
        Error::Status(Reply::new(StatusCode(code), "reason"))
    }

    #[test]
    fn test_file_and_dir() {
        assert!(matches!(file_error(status(550), "op"), Error::ObjectNotFound));
        assert!(matches!(dir_error(status(550), "op"), Error::DirNotFound));

        let err = file_error(status(530), "list");
        assert_eq!(err.to_string(), "list: 530 reason");
        assert!(matches!(dir_error(Error::Timeout, "rmdir"), Error::Context { .. }));
    }

    #[test]
    fn test_wrapped_status_is_not_reclassified() {
        let err = status(550).context("dial");
        assert!(matches!(file_error(err, "list"), Error::Context { .. }));
    }

    #[test]
    fn test_benign_close() {
        assert!(is_benign_close(&status(426)));
        assert!(is_benign_close(&status(550)));
        assert!(!is_benign_close(&status(451)));
        assert!(!is_benign_close(&Error::IO("reset".to_owned())));
    }
}
