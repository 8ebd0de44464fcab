use std::{
    fs::File,
    os::fd::{AsFd, OwnedFd},
    process::Stdio,
};

use crate::error::EngineError;

/// Where one standard stream of a process to be spawned points.
#[derive(Debug, Default)]
pub enum Binding {
    /// The orchestrator's own stream.
    #[default]
    Inherit,
    Fd(OwnedFd),
}

impl From<OwnedFd> for Binding {
    fn from(value: OwnedFd) -> Self {
        Self::Fd(value)
    }
}

impl From<File> for Binding {
    fn from(value: File) -> Self {
        Self::Fd(value.into())
    }
}

impl Binding {
    /// Duplicates the descriptor so two scopes can hold the same stream.
    pub fn try_clone(&self) -> Result<Self, EngineError> {
        match self {
            Self::Inherit => Ok(Self::Inherit),
            Self::Fd(fd) => fd
                .as_fd()
                .try_clone_to_owned()
                .map(Self::Fd)
                .map_err(EngineError::Duplicate),
        }
    }

    pub fn into_stdio(self) -> Stdio {
        match self {
            Self::Inherit => Stdio::inherit(),
            Self::Fd(fd) => Stdio::from(fd),
        }
    }
}

/// The standard input and output a dispatched node runs against. A scope
/// rebinds a stream by building a new value for its children; dropping that
/// value is the restore.
#[derive(Debug, Default)]
pub struct Streams {
    pub stdin: Binding,
    pub stdout: Binding,
}

impl Streams {
    pub fn inherit() -> Self {
        Self::default()
    }

    pub fn try_clone(&self) -> Result<Self, EngineError> {
        Ok(Self {
            stdin: self.stdin.try_clone()?,
            stdout: self.stdout.try_clone()?,
        })
    }

    pub fn with_stdin(self, stdin: impl Into<Binding>) -> Self {
        Self {
            stdin: stdin.into(),
            ..self
        }
    }

    pub fn with_stdout(self, stdout: impl Into<Binding>) -> Self {
        Self {
            stdout: stdout.into(),
            ..self
        }
    }
}

/// An anonymous pipe whose ends are both close-on-exec, so a spawned process
/// only ever holds the end it was handed as a standard stream.
#[derive(Debug)]
pub struct Pipe {
    pub reader: OwnedFd,
    pub writer: OwnedFd,
}

impl Pipe {
    pub fn new() -> Result<Self, EngineError> {
        let (reader, writer) = cloexec_pipe().map_err(EngineError::Pipe)?;
        trace!(?reader, ?writer, "created pipe");
        Ok(Self { reader, writer })
    }
}

#[cfg(not(target_vendor = "apple"))]
fn cloexec_pipe() -> nix::Result<(OwnedFd, OwnedFd)> {
    nix::unistd::pipe2(nix::fcntl::OFlag::O_CLOEXEC)
}

#[cfg(target_vendor = "apple")]
fn cloexec_pipe() -> nix::Result<(OwnedFd, OwnedFd)> {
    use nix::fcntl::{fcntl, FcntlArg, FdFlag};
    use std::os::fd::AsRawFd;

    let (reader, writer) = nix::unistd::pipe()?;
    for fd in [&reader, &writer] {
        fcntl(fd.as_raw_fd(), FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC))?;
    }
    Ok((reader, writer))
}

#[cfg(test)]
mod tests {
    use std::{
        io::{Read, Write},
        os::fd::AsRawFd,
    };

    use nix::fcntl::{fcntl, FcntlArg, FdFlag};

    use super::*;

    fn is_cloexec(fd: &OwnedFd) -> bool {
        let flags = fcntl(fd.as_raw_fd(), FcntlArg::F_GETFD).unwrap();
        FdFlag::from_bits_truncate(flags).contains(FdFlag::FD_CLOEXEC)
    }

    #[test]
    fn pipe_ends_are_close_on_exec() {
        let pipe = Pipe::new().unwrap();
        assert!(is_cloexec(&pipe.reader));
        assert!(is_cloexec(&pipe.writer));
    }

    #[test]
    fn cloned_binding_shares_the_stream() {
        let pipe = Pipe::new().unwrap();
        let binding = Binding::from(pipe.writer);
        let Binding::Fd(copy) = binding.try_clone().unwrap() else {
            panic!("expected a descriptor binding");
        };
        assert!(is_cloexec(&copy));

        File::from(copy).write_all(b"through the copy\n").unwrap();
        drop(binding);

        let mut out = String::new();
        File::from(pipe.reader).read_to_string(&mut out).unwrap();
        assert_eq!(out, "through the copy\n");
    }

    #[test]
    fn rebinding_leaves_the_other_stream() {
        let pipe = Pipe::new().unwrap();
        let streams = Streams::inherit().with_stdout(pipe.writer);

        assert!(matches!(streams.stdin, Binding::Inherit));
        assert!(matches!(streams.stdout, Binding::Fd(_)));

        let cloned = streams.try_clone().unwrap();
        assert!(matches!(cloned.stdin, Binding::Inherit));
        assert!(matches!(cloned.stdout, Binding::Fd(_)));
    }
}
