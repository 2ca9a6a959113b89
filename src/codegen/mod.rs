use crate::{
    ast::{Ast, Ident, Program},
    intrinsics,
    token::Spanned,
    util::intern::{Interner, Name},
};

pub mod stack;
pub mod text;

pub type Result<T, E = Spanned<Error>> = std::result::Result<T, E>;

/// Lowers a type checked program into one output form.
pub trait Generator<'a>: Sized {
    fn new(ast: &'a Ast, idents: &'a Interner) -> Self;

    fn generate(self, program: &Program) -> Result<String>;
}

pub fn generate(
    backend: Backend,
    program: &Program,
    ast: &Ast,
    idents: &Interner,
) -> Result<String> {
    let output = match backend {
        Backend::Text => text::TextGenerator::new(ast, idents).generate(program)?,
        Backend::Stack => stack::StackGenerator::new(ast, idents).generate(program)?,
    };
    log::debug!("generated {} bytes of {backend} output", output.len());
    Ok(output)
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Backend {
    /// C++ source, to be built by a native compiler.
    #[default]
    Text,
    /// x86-64 NASM assembly for Linux, using an explicit operand stack.
    Stack,
}

impl Backend {
    pub const ALL: &[Backend] = &[Backend::Text, Backend::Stack];

    pub const fn name(self) -> &'static str {
        match self {
            Backend::Text => "text",
            Backend::Stack => "stack",
        }
    }

    /// File the output is written to when none is given.
    pub const fn default_output(self) -> &'static str {
        match self {
            Backend::Text => "out.cpp",
            Backend::Stack => "out.asm",
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Backend::ALL
            .iter()
            .copied()
            .find(|backend| backend.name() == s)
            .ok_or_else(|| format!("unknown backend `{s}` (expected `text` or `stack`)"))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    UnknownIdentifier(Name),
    Redeclaration(Name),
    Intrinsic(intrinsics::Error),
    /// A construct the selected backend has no lowering for.
    Unsupported(&'static str),
}

/// Names bound by a generator, scoped like the source program.
///
/// Both backends re-derive visibility while they walk the tree, so a tree
/// that references an unbound name (or binds a visible one twice) is refused
/// instead of producing broken output.
#[derive(Debug)]
pub(crate) struct Bindings<T> {
    entries: Vec<(Name, T)>,
    frames: Vec<Frame>,
}

#[derive(Copy, Clone, Debug)]
struct Frame {
    /// Index of the first entry bound in this frame.
    start: usize,
    /// Isolated frames only see their own entries and the global ones.
    isolated: bool,
}

impl<T: Copy> Bindings<T> {
    pub fn new() -> Self {
        Bindings {
            entries: Vec::with_capacity(32),
            frames: vec![Frame {
                start: 0,
                isolated: false,
            }],
        }
    }

    pub fn enter(&mut self) {
        self.push_frame(false);
    }

    /// Enters a frame from which the locals of the enclosing frames are
    /// hidden, as if it were opened at the top level.
    pub fn enter_isolated(&mut self) {
        self.push_frame(true);
    }

    /// Leaves the current frame, returning the values bound in it.
    pub fn leave(&mut self) -> Vec<T> {
        debug_assert!(self.frames.len() > 1, "can't leave the global frame");
        let start = self.frames.pop().map_or(0, |frame| frame.start);
        self.entries.drain(start..).map(|(_, value)| value).collect()
    }

    pub fn get(&self, ident: Ident) -> Result<T> {
        self.find(ident.name)
            .ok_or_else(|| ident.line.wrap(Error::UnknownIdentifier(ident.name)))
    }

    pub fn bind(&mut self, ident: Ident, value: T) -> Result<()> {
        if self.find(ident.name).is_some() {
            return Err(ident.line.wrap(Error::Redeclaration(ident.name)));
        }
        self.entries.push((ident.name, value));
        Ok(())
    }

    fn push_frame(&mut self, isolated: bool) {
        self.frames.push(Frame {
            start: self.entries.len(),
            isolated,
        });
    }

    fn find(&self, name: Name) -> Option<T> {
        let lookup = |entries: &[(Name, T)]| {
            entries
                .iter()
                .rev()
                .find(|(bound, _)| *bound == name)
                .map(|(_, value)| *value)
        };

        let mut end = self.entries.len();
        for frame in self.frames.iter().skip(1).rev() {
            if let Some(value) = lookup(&self.entries[frame.start..end]) {
                return Some(value);
            }
            end = frame.start;
            if frame.isolated {
                end = self.frames.get(1).map_or(end, |first| first.start);
                break;
            }
        }
        lookup(&self.entries[..end])
    }
}
