//! Bytecode: an instruction sequence with a label index, and the builder
//! that assembles one.

use std::collections::HashMap;

use crate::error::BuildError;
use crate::instruction::{Instruction, Op};

/// An immutable instruction sequence, queryable by label.
#[derive(Debug, Clone, PartialEq)]
pub struct Bytecode {
    owner: String,
    instructions: Vec<Instruction>,
    labels: HashMap<String, usize>,
}

impl Bytecode {
    /// Index the labels of `instructions`. Fails on a label attached to two
    /// instructions.
    pub fn new(owner: impl Into<String>, instructions: Vec<Instruction>) -> Result<Self, BuildError> {
        let mut labels: HashMap<String, usize> = HashMap::new();
        for (ix, instr) in instructions.iter().enumerate() {
            for label in &instr.labels {
                if let Some(&first) = labels.get(label) {
                    return Err(BuildError::DuplicateLabel {
                        label: label.clone(),
                        first,
                        second: ix,
                    });
                }
                labels.insert(label.clone(), ix);
            }
        }
        Ok(Self {
            owner: owner.into(),
            instructions,
            labels,
        })
    }

    pub fn builder(owner: impl Into<String>) -> BytecodeBuilder {
        BytecodeBuilder::new(owner)
    }

    /// Name of the function or module this bytecode belongs to.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn get(&self, ix: usize) -> Option<&Instruction> {
        self.instructions.get(ix)
    }

    /// Index of the instruction carrying `label`.
    pub fn label_index(&self, label: &str) -> Option<usize> {
        self.labels.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

/// Incremental bytecode assembly.
///
/// Labels set with [`label`](Self::label) attach to the next pushed
/// instruction. Bookmarks and deferred blocks let a code generator emit a
/// stretch of instructions now and splice it in later, as comprehensions
/// need: the element expression is generated before the loop around it.
#[derive(Debug)]
pub struct BytecodeBuilder {
    owner: String,
    /// Main block at index 0; open deferred blocks above it.
    blocks: Vec<Vec<Instruction>>,
    deferred: Vec<Vec<Instruction>>,
    bookmarks: Vec<usize>,
    pending_labels: Vec<String>,
    current_line: Option<u32>,
    next_label: usize,
}

impl BytecodeBuilder {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            blocks: vec![Vec::new()],
            deferred: Vec::new(),
            bookmarks: Vec::new(),
            pending_labels: Vec::new(),
            current_line: None,
            next_label: 0,
        }
    }

    fn current(&mut self) -> &mut Vec<Instruction> {
        if self.blocks.is_empty() {
            self.blocks.push(Vec::new());
        }
        let top = self.blocks.len() - 1;
        &mut self.blocks[top]
    }

    /// Append an instruction, attaching pending labels and the current line.
    pub fn push(&mut self, op: Op) -> &mut Self {
        let mut instr = Instruction::new(op);
        instr.line = self.current_line;
        for label in self.pending_labels.drain(..) {
            instr.add_label(label);
        }
        self.current().push(instr);
        self
    }

    /// Label the next pushed instruction.
    pub fn label(&mut self, label: impl Into<String>) -> &mut Self {
        self.pending_labels.push(label.into());
        self
    }

    /// A label unique within this builder.
    pub fn fresh_label(&mut self) -> String {
        self.next_label += 1;
        format!("L.{}", self.next_label)
    }

    /// Source line for subsequently pushed instructions.
    pub fn set_line(&mut self, line: u32) -> &mut Self {
        self.current_line = Some(line);
        self
    }

    /// Remember the current end of the active block.
    pub fn bookmark(&mut self) -> &mut Self {
        let at = self.current().len();
        self.bookmarks.push(at);
        self
    }

    pub fn discard_bookmark(&mut self) -> Result<&mut Self, BuildError> {
        self.bookmarks.pop().ok_or(BuildError::NoBookmark)?;
        Ok(self)
    }

    /// Cut everything pushed since the last bookmark and set it aside as a
    /// deferred block.
    pub fn defer_bookmarked_block(&mut self) -> Result<&mut Self, BuildError> {
        let at = self.bookmarks.pop().ok_or(BuildError::NoBookmark)?;
        let current = self.current();
        let at = at.min(current.len());
        let block = current.split_off(at);
        self.deferred.push(block);
        Ok(self)
    }

    /// Redirect pushes into a new block until `end_deferred_block`.
    pub fn start_deferred_block(&mut self) -> &mut Self {
        self.blocks.push(Vec::new());
        self
    }

    /// Set the block opened by `start_deferred_block` aside.
    pub fn end_deferred_block(&mut self) -> Result<&mut Self, BuildError> {
        if self.blocks.len() < 2 {
            return Err(BuildError::NotInDeferredBlock);
        }
        if let Some(block) = self.blocks.pop() {
            self.deferred.push(block);
        }
        Ok(self)
    }

    /// Append the most recently deferred block to the active block.
    pub fn pop_deferred_block(&mut self) -> Result<&mut Self, BuildError> {
        let block = self.deferred.pop().ok_or(BuildError::NoDeferredBlock)?;
        self.current().extend(block);
        Ok(self)
    }

    /// Number of instructions in the active block.
    pub fn len(&self) -> usize {
        self.blocks.last().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn finish(mut self) -> Result<Bytecode, BuildError> {
        if let Some(label) = self.pending_labels.first() {
            return Err(BuildError::DanglingLabel(label.clone()));
        }
        if !self.bookmarks.is_empty() {
            return Err(BuildError::OpenBookmarks(self.bookmarks.len()));
        }
        let unmerged = self.deferred.len() + self.blocks.len().saturating_sub(1);
        if unmerged > 0 {
            return Err(BuildError::UnmergedDeferredBlocks(unmerged));
        }
        let main = self.blocks.pop().unwrap_or_default();
        Bytecode::new(self.owner, main)
    }
}
