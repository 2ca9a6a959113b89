use std::collections::HashMap;

use crate::{token::Line, types::ValueType, util::intern::Name};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Function,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Symbol {
    pub ty: ValueType,
    pub kind: SymbolKind,
    /// Declaration site.
    pub line: Line,
}

/// Name to declared type mapping of one compilation.
///
/// Frames follow the lexical scopes being parsed. A name is visible from the
/// frame where it was declared until that frame is popped. Shadowing is not
/// allowed: a name visible from the current frame can't be declared again.
#[derive(Debug)]
pub struct SymbolTable {
    frames: Vec<HashMap<Name, Symbol>>,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable {
            frames: vec![HashMap::new()],
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn enter(&mut self) {
        self.frames.push(HashMap::new());
    }

    pub fn leave(&mut self) {
        assert!(self.frames.len() > 1, "can't leave the global frame");
        let frame = self.frames.pop();
        log::trace!(
            "leaving frame with {} symbols",
            frame.map_or(0, |f| f.len())
        );
    }

    pub fn get(&self, name: Name) -> Option<Symbol> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(&name).copied())
    }

    /// Declares `name` in the current frame.
    ///
    /// Fails with the previous declaration if the name is already visible.
    pub fn declare(&mut self, name: Name, symbol: Symbol) -> Result<(), Symbol> {
        if let Some(previous) = self.get(name) {
            return Err(previous);
        }
        self.current_mut().insert(name, symbol);
        Ok(())
    }

    fn current_mut(&mut self) -> &mut HashMap<Name, Symbol> {
        self.frames.last_mut().expect("global frame is never popped")
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::intern::Interner;

    fn var(ty: ValueType, line: u32) -> Symbol {
        Symbol {
            ty,
            kind: SymbolKind::Variable,
            line: Line(line),
        }
    }

    #[test]
    fn declare_and_get() {
        let mut i = Interner::with_capacity(4);
        let x = i.intern("x");
        let y = i.intern("y");

        let mut table = SymbolTable::new();
        assert_eq!(table.declare(x, var(ValueType::Int, 1)), Ok(()));
        assert_eq!(table.get(x), Some(var(ValueType::Int, 1)));
        assert_eq!(table.get(y), None);
    }

    #[test]
    fn redeclaration_reports_previous() {
        let mut i = Interner::with_capacity(4);
        let x = i.intern("x");

        let mut table = SymbolTable::new();
        table.declare(x, var(ValueType::Int, 1)).unwrap();
        assert_eq!(
            table.declare(x, var(ValueType::Char, 2)),
            Err(var(ValueType::Int, 1))
        );

        // Inner frames can't shadow either.
        table.enter();
        assert_eq!(
            table.declare(x, var(ValueType::Bool, 3)),
            Err(var(ValueType::Int, 1))
        );
    }

    #[test]
    fn names_die_with_their_frame() {
        let mut i = Interner::with_capacity(4);
        let x = i.intern("x");

        let mut table = SymbolTable::new();
        table.enter();
        table.declare(x, var(ValueType::Int, 1)).unwrap();
        table.leave();
        assert_eq!(table.get(x), None);

        // A sibling frame may reuse the name.
        table.enter();
        assert_eq!(table.declare(x, var(ValueType::Char, 5)), Ok(()));
        assert_eq!(table.depth(), 2);
    }
}
