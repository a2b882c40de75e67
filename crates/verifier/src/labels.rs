//! Every branch target must name a label in the same bytecode.

use crate::error::VerifyError;
use tarn_common::Bytecode;

/// Run the label resolution check.
pub fn check_labels(bytecode: &Bytecode) -> Vec<VerifyError> {
    bytecode
        .instructions()
        .iter()
        .enumerate()
        .filter_map(|(i, instr)| {
            let label = instr.op.target_label()?;
            match bytecode.label_index(label) {
                Some(_) => None,
                None => Some(VerifyError::UndefinedLabel {
                    at: i,
                    label: label.to_string(),
                }),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tarn_common::{Instruction, Name, Op};

    #[test]
    fn resolved_labels_pass() {
        let bytecode = Bytecode::new(
            "t",
            vec![
                Instruction::new(Op::Jump("END".into())),
                Instruction::new(Op::Nop).with_label("END"),
            ],
        )
        .unwrap();
        assert!(check_labels(&bytecode).is_empty());
    }

    #[test]
    fn every_branch_kind_is_checked() {
        let bytecode = Bytecode::new(
            "t",
            vec![
                Instruction::new(Op::Jump("a".into())),
                Instruction::new(Op::Test("b".into())),
                Instruction::new(Op::Next("c".into())),
                Instruction::new(Op::EndLoop("d".into())),
                Instruction::new(Op::EnterContext {
                    var: Name::empty(),
                    catch: "e".into(),
                }),
            ],
        )
        .unwrap();
        let labels: Vec<(usize, String)> = check_labels(&bytecode)
            .into_iter()
            .map(|e| match e {
                VerifyError::UndefinedLabel { at, label } => (at, label),
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(
            labels,
            vec![
                (0, "a".to_string()),
                (1, "b".to_string()),
                (2, "c".to_string()),
                (3, "d".to_string()),
                (4, "e".to_string()),
            ]
        );
    }
}
