/*!
 * Groups signals into messages and builds the message identifier table
 */

use std::collections::HashMap;

use serde::Serialize;

use crate::signal::Signal;

/// Diagnostic request frame, always present in the identifier table.
pub const DIAG_REQ: (&str, u32) = ("DIAG_REQ", 0x3C);
/// Diagnostic response frame, always present in the identifier table.
pub const DIAG_RSP: (&str, u32) = ("DIAG_RSP", 0x3D);

pub const SYNTHETIC_MESSAGES: [(&str, u32); 2] = [DIAG_REQ, DIAG_RSP];

/// Reserved names get no byte layout of their own.
pub fn is_synthetic_name(name: &str) -> bool {
    SYNTHETIC_MESSAGES.iter().any(|(synthetic, _)| *synthetic == name)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageGroup {
    pub name: String,
    pub id: u32,
    pub signals: Vec<Signal>,
}

impl MessageGroup {
    pub fn is_synthetic(&self) -> bool {
        is_synthetic_name(&self.name)
    }
}

/// Bucket signals by message name.
///
/// Groups come out in first-seen order, signals in input order. The group
/// identifier is the one carried by the first signal seen for that name.
pub fn group_signals(signals: Vec<Signal>) -> Vec<MessageGroup> {
    let mut groups: Vec<MessageGroup> = Vec::new();
    let mut index_by_name: HashMap<String, usize> = HashMap::new();

    for signal in signals {
        match index_by_name.get(&signal.message_name) {
            Some(&index) => groups[index].signals.push(signal),
            None => {
                index_by_name.insert(signal.message_name.clone(), groups.len());
                groups.push(MessageGroup {
                    name: signal.message_name.clone(),
                    id: signal.message_id,
                    signals: vec![signal],
                });
            }
        }
    }
    groups
}

/// One entry of the message identifier / index enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentifierEntry {
    pub name: String,
    pub id: u32,
    pub index: usize,
}

/// Input messages in first-seen order followed by the two diagnostic frames.
///
/// An input group that reuses a reserved name is not listed twice; the fixed
/// diagnostic identifier wins.
pub fn identifier_table(groups: &[MessageGroup]) -> Vec<IdentifierEntry> {
    groups
        .iter()
        .filter(|group| !group.is_synthetic())
        .map(|group| (group.name.as_str(), group.id))
        .chain(SYNTHETIC_MESSAGES)
        .enumerate()
        .map(|(index, (name, id))| IdentifierEntry {
            name: name.to_owned(),
            id,
            index,
        })
        .collect()
}
