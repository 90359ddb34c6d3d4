//! Rule blocks: the indexing units the transformer walks for each package.
//!
//! Blocks yield candidate rule numbers lazily through a [`BlockCursor`].
//! Candidates are pulled one at a time and every pull re-reads the current
//! effective name, because an applied rule may rename the package and so
//! change what later lookups should find.
//!
//! | Variant | Wraps | Yields |
//! |---------|-------|--------|
//! | `Direct` | one rule | that rule, once |
//! | `NameMap` | consecutive rules with `name` | next rule listing the current name |
//! | `Covering` | many cold name / namepat blocks | children's candidates, if the name passes the gate |

use crate::config::TransformerConfig;
use crate::error::{Result, TransformError};
use crate::rule::{PatternUnion, Rule};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum RuleBlock {
    Direct {
        rule: usize,
    },
    NameMap {
        rules: Vec<usize>,
        name_map: HashMap<String, Vec<usize>>,
    },
    Covering {
        names: HashSet<String>,
        patterns: PatternUnion,
        blocks: Vec<Arc<RuleBlock>>,
    },
}

/// Iteration state of one block for one package.
#[derive(Debug, Default)]
pub struct BlockCursor {
    state: CursorState,
}

#[derive(Debug, Default)]
enum CursorState {
    #[default]
    Fresh,
    Scanning {
        min_number: usize,
    },
    Delegating {
        child: usize,
        inner: Box<BlockCursor>,
    },
    Exhausted,
}

impl RuleBlock {
    pub fn direct(rule: &Rule) -> Self {
        RuleBlock::Direct {
            rule: rule.number(),
        }
    }

    /// Build a name-indexed block. Every rule must carry a `name` list.
    pub fn name_map(rules: &[&Rule]) -> Result<Self> {
        let mut name_map: HashMap<String, Vec<usize>> = HashMap::new();
        for rule in rules {
            let names = rule.names().ok_or(TransformError::UnexpectedRuleKind {
                rule: rule.number(),
                block: "name map",
            })?;
            for name in names {
                name_map.entry(name.clone()).or_default().push(rule.number());
            }
        }

        Ok(RuleBlock::NameMap {
            rules: rules.iter().map(|rule| rule.number()).collect(),
            name_map,
        })
    }

    /// Merge `blocks` behind a single name gate. Every rule must carry
    /// `name` or `namepat`; the combined pattern must fit in `size_limit`.
    pub fn covering(
        blocks: Vec<Arc<RuleBlock>>,
        rules: &[Rule],
        size_limit: usize,
    ) -> Result<Self> {
        let mut names = HashSet::new();
        let mut sources = Vec::new();

        for number in blocks.iter().flat_map(|block| block.rule_numbers()) {
            let rule = &rules[number];
            if let Some(rule_names) = rule.names() {
                names.extend(rule_names.iter().cloned());
            } else if let Some(namepat) = rule.namepat() {
                sources.push(namepat.source());
            } else {
                return Err(TransformError::UnexpectedRuleKind {
                    rule: number,
                    block: "covering",
                });
            }
        }

        let patterns = PatternUnion::new(sources, size_limit).map_err(|source| {
            let first_rule = blocks.first().map(|b| b.rule_range().0).unwrap_or_default();
            let last_rule = blocks.last().map(|b| b.rule_range().1).unwrap_or_default();
            TransformError::CoveringPattern {
                first_rule,
                last_rule,
                source,
            }
        })?;

        Ok(RuleBlock::Covering {
            names,
            patterns,
            blocks,
        })
    }

    /// Next candidate rule number for a package currently named `effname`.
    pub fn next_candidate(&self, effname: &str, cursor: &mut BlockCursor) -> Option<usize> {
        match self {
            RuleBlock::Direct { rule } => match cursor.state {
                CursorState::Fresh => {
                    cursor.state = CursorState::Exhausted;
                    Some(*rule)
                }
                _ => None,
            },
            RuleBlock::NameMap { name_map, .. } => {
                let min_number = match cursor.state {
                    CursorState::Fresh => 0,
                    CursorState::Scanning { min_number } => min_number,
                    _ => return None,
                };

                let found = name_map
                    .get(effname)
                    .and_then(|numbers| numbers.iter().copied().find(|n| *n >= min_number));

                cursor.state = match found {
                    Some(number) => CursorState::Scanning {
                        min_number: number + 1,
                    },
                    None => CursorState::Exhausted,
                };
                found
            }
            RuleBlock::Covering {
                names,
                patterns,
                blocks,
            } => {
                if let CursorState::Fresh = cursor.state {
                    if !names.contains(effname) && !patterns.is_match(effname) {
                        cursor.state = CursorState::Exhausted;
                        return None;
                    }
                    cursor.state = CursorState::Delegating {
                        child: 0,
                        inner: Box::default(),
                    };
                }

                let CursorState::Delegating { child, inner } = &mut cursor.state else {
                    return None;
                };

                while let Some(block) = blocks.get(*child) {
                    if let Some(number) = block.next_candidate(effname, inner) {
                        return Some(number);
                    }
                    *child += 1;
                    **inner = BlockCursor::default();
                }

                cursor.state = CursorState::Exhausted;
                None
            }
        }
    }

    /// Every rule number in the block, in rule order.
    pub fn rule_numbers(&self) -> Box<dyn Iterator<Item = usize> + '_> {
        match self {
            RuleBlock::Direct { rule } => Box::new(std::iter::once(*rule)),
            RuleBlock::NameMap { rules, .. } => Box::new(rules.iter().copied()),
            RuleBlock::Covering { blocks, .. } => {
                Box::new(blocks.iter().flat_map(|block| block.rule_numbers()))
            }
        }
    }

    /// First and last rule number covered by the block.
    pub fn rule_range(&self) -> (usize, usize) {
        match self {
            RuleBlock::Direct { rule } => (*rule, *rule),
            RuleBlock::NameMap { rules, .. } => (
                rules.first().copied().unwrap_or_default(),
                rules.last().copied().unwrap_or_default(),
            ),
            RuleBlock::Covering { blocks, .. } => (
                blocks.first().map(|b| b.rule_range().0).unwrap_or_default(),
                blocks.last().map(|b| b.rule_range().1).unwrap_or_default(),
            ),
        }
    }

    pub fn is_covering(&self) -> bool {
        matches!(self, RuleBlock::Covering { .. })
    }
}

/// Initial block partition, mirroring rule order.
///
/// Runs of consecutive rules with a `name` list become one name-indexed block
/// (or direct blocks, if the run is shorter than the configured minimum);
/// every other rule becomes a direct block.
pub fn partition_rules(rules: &[Rule], config: &TransformerConfig) -> Result<Vec<Arc<RuleBlock>>> {
    let mut blocks = Vec::new();
    let mut current_name_rules: Vec<&Rule> = Vec::new();

    for rule in rules {
        if rule.names().is_some() {
            current_name_rules.push(rule);
        } else {
            flush_name_rules(&mut current_name_rules, &mut blocks, config)?;
            blocks.push(Arc::new(RuleBlock::direct(rule)));
        }
    }
    flush_name_rules(&mut current_name_rules, &mut blocks, config)?;

    Ok(blocks)
}

fn flush_name_rules(
    current: &mut Vec<&Rule>,
    blocks: &mut Vec<Arc<RuleBlock>>,
    config: &TransformerConfig,
) -> Result<()> {
    if current.is_empty() {
        return Ok(());
    }
    if current.len() >= config.namemap_block_min_size {
        blocks.push(Arc::new(RuleBlock::name_map(current)?));
    } else {
        blocks.extend(current.iter().map(|rule| Arc::new(RuleBlock::direct(rule))));
    }
    current.clear();
    Ok(())
}
