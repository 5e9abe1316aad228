use crate::term::NodeKind;
use crate::ty::Ty;

use colored::*;
use std::{fmt, io};

pub type SynthResult<T = ()> = Result<T, SynthError>;

#[derive(Clone, Debug, PartialEq)]
pub enum SynthErrorKind {
    Synthesis(NodeKind),
    ObjectCreation(Option<Ty>),
    Operation,
    Config,
    Emit,
    Eval,
    IO,
    Fatal,
}

impl fmt::Display for SynthErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SynthErrorKind::Synthesis(kind) => write!(f, "synthesis error ({})", kind),
            SynthErrorKind::ObjectCreation(Some(ty)) => {
                write!(f, "object creation error ({})", ty)
            }
            SynthErrorKind::ObjectCreation(None) => write!(f, "object creation error"),
            SynthErrorKind::Operation => write!(f, "operation fault"),
            SynthErrorKind::Config => write!(f, "invalid configuration"),
            SynthErrorKind::Emit => write!(f, "emit error"),
            SynthErrorKind::Eval => write!(f, "evaluation error"),
            SynthErrorKind::IO => write!(f, "i/o error"),
            SynthErrorKind::Fatal => write!(f, "fatal error"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SynthError {
    pub msg: String,
    pub kind: SynthErrorKind,
    pub cause: Option<Box<SynthError>>,
}

impl fmt::Display for SynthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.msg)?;
        if let Some(cause) = &self.cause {
            write!(f, " (caused by {})", cause)?;
        }
        Ok(())
    }
}

impl std::error::Error for SynthError {}

impl SynthError {
    pub fn synthesis<S: Into<String>>(kind: NodeKind, msg: S) -> SynthError {
        SynthError {
            msg: msg.into(),
            kind: SynthErrorKind::Synthesis(kind),
            cause: None,
        }
    }

    /// Wraps `cause` into a kind-level failure for `kind`.
    pub fn synthesis_caused_by(kind: NodeKind, cause: SynthError) -> SynthError {
        SynthError {
            msg: format!("node of kind `{}` could not be created", kind),
            kind: SynthErrorKind::Synthesis(kind),
            cause: Some(Box::new(cause)),
        }
    }

    pub fn object_creation(ty: Option<&Ty>) -> SynthError {
        let msg = match ty {
            Some(ty) => format!("no registered operation could produce a value of type `{}`", ty),
            None => str!("no type was requested"),
        };
        SynthError {
            msg,
            kind: SynthErrorKind::ObjectCreation(ty.cloned()),
            cause: None,
        }
    }

    /// A failure raised by an operation itself. The value synthesizer treats
    /// these as "try the next candidate".
    pub fn fault<S: Into<String>>(msg: S) -> SynthError {
        SynthError {
            msg: msg.into(),
            kind: SynthErrorKind::Operation,
            cause: None,
        }
    }

    pub fn config<S: Into<String>>(msg: S) -> SynthError {
        SynthError {
            msg: msg.into(),
            kind: SynthErrorKind::Config,
            cause: None,
        }
    }

    pub fn emit<S: Into<String>>(msg: S) -> SynthError {
        SynthError {
            msg: msg.into(),
            kind: SynthErrorKind::Emit,
            cause: None,
        }
    }

    pub fn eval<S: Into<String>>(msg: S) -> SynthError {
        SynthError {
            msg: msg.into(),
            kind: SynthErrorKind::Eval,
            cause: None,
        }
    }

    pub fn fatal<S: Into<String>>(msg: S) -> SynthError {
        SynthError {
            msg: msg.into(),
            kind: SynthErrorKind::Fatal,
            cause: None,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.kind,
            SynthErrorKind::Synthesis(_)
                | SynthErrorKind::ObjectCreation(_)
                | SynthErrorKind::Operation
        )
    }

    /// Walks the cause chain down to the innermost error.
    pub fn root_cause(&self) -> &SynthError {
        let mut err = self;
        while let Some(cause) = &err.cause {
            err = cause;
        }
        err
    }

    pub fn emit_to_stderr(self) {
        let kind = format!("{}:", self.kind);
        eprintln!("{} {}", kind.bold().red(), self.msg.bold());

        let mut cause = self.cause;
        let arrow = "-->".bold();
        while let Some(err) = cause {
            eprintln!(" {} {} {}", arrow, format!("{}:", err.kind).red(), err.msg);
            cause = err.cause;
        }
        eprintln!()
    }
}

impl From<SynthError> for Vec<SynthError> {
    fn from(err: SynthError) -> Vec<SynthError> {
        vec![err]
    }
}

impl From<io::Error> for SynthError {
    fn from(err: io::Error) -> SynthError {
        SynthError {
            msg: err.to_string(),
            kind: SynthErrorKind::IO,
            cause: None,
        }
    }
}

impl From<Box<bincode::ErrorKind>> for SynthError {
    fn from(err: Box<bincode::ErrorKind>) -> SynthError {
        SynthError {
            msg: err.to_string(),
            kind: SynthErrorKind::Config,
            cause: None,
        }
    }
}
