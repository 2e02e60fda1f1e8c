//! Streamed tool-call reassembly for OpenAI-family decoders
//!
//! Vendors in the OpenAI family deliver tool calls as fragments spread over
//! many stream chunks: the id and function name usually arrive first, the
//! JSON arguments in arbitrary string slices after that, identified only by
//! the vendor's `tool_calls` array index. Fragments are matched by stable id
//! when present, falling back to the index, and an index-only accumulator
//! migrates under the real id when one arrives late.

use crate::types::ToolCall;

#[derive(Debug)]
struct Accumulator {
    id: Option<String>,
    index: Option<u32>,
    name: Option<String>,
    arguments: String,
}

/// Buffers streamed tool-call fragments until their arguments parse as JSON
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    entries: Vec<Accumulator>,
}

impl ToolCallAccumulator {
    /// Empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one streamed fragment into its accumulator
    pub fn ingest(&mut self, index: Option<u32>, id: Option<&str>, name: Option<&str>, arguments: Option<&str>) {
        let entry = self.entry_for(index, id);
        if entry.name.is_none()
            && let Some(name) = name
        {
            entry.name = Some(name.to_owned());
        }
        if let Some(fragment) = arguments {
            entry.arguments.push_str(fragment);
        }
    }

    /// Locate or create the accumulator a fragment belongs to
    fn entry_for(&mut self, index: Option<u32>, id: Option<&str>) -> &mut Accumulator {
        let pos = if let Some(id) = id {
            // Prefer the stable id; adopt an index-keyed accumulator when
            // the id shows up after index-only fragments
            self.entries
                .iter()
                .position(|e| e.id.as_deref() == Some(id))
                .or_else(|| {
                    let adopted = self
                        .entries
                        .iter()
                        .position(|e| e.id.is_none() && index.is_some() && e.index == index);
                    if let Some(p) = adopted {
                        self.entries[p].id = Some(id.to_owned());
                    }
                    adopted
                })
        } else {
            index.and_then(|idx| self.entries.iter().position(|e| e.index == Some(idx)))
        };

        match pos {
            Some(p) => &mut self.entries[p],
            None => {
                self.entries.push(Accumulator {
                    id: id.map(ToOwned::to_owned),
                    index,
                    name: None,
                    arguments: String::new(),
                });
                self.entries.last_mut().expect("entry just pushed")
            }
        }
    }

    /// Drain the accumulators into finished tool calls, in arrival order
    ///
    /// A call is emitted only when it has a name and its concatenated
    /// arguments parse as JSON; anything else is dropped silently.
    pub fn finalize(&mut self) -> Vec<ToolCall> {
        self.entries
            .drain(..)
            .filter_map(|entry| {
                let Some(name) = entry.name else {
                    tracing::debug!("dropping tool call fragment without a function name");
                    return None;
                };
                let input = match serde_json::from_str(&entry.arguments) {
                    Ok(value) => value,
                    Err(e) => {
                        tracing::debug!(
                            function = %name,
                            error = %e,
                            "dropping tool call with unparsable arguments"
                        );
                        return None;
                    }
                };
                let id = entry
                    .id
                    .unwrap_or_else(|| format!("call_{}", entry.index.unwrap_or(0)));
                Some(ToolCall { id, name, input })
            })
            .collect()
    }

    /// Whether any fragments are buffered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reassembles_arguments_fragmented_across_index_only_chunks() {
        let mut acc = ToolCallAccumulator::new();
        acc.ingest(Some(0), Some("call_1"), Some("get_weather"), None);
        acc.ingest(Some(0), None, None, Some("{\"location\":"));
        acc.ingest(Some(0), None, None, Some("\"SF\"}"));
        let calls = acc.finalize();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "call_1");
        assert_eq!(calls[0].name, "get_weather");
        assert_eq!(calls[0].input, serde_json::json!({"location": "SF"}));
    }

    #[test]
    fn migrates_index_keyed_fragments_under_a_late_id() {
        let mut acc = ToolCallAccumulator::new();
        acc.ingest(Some(0), None, Some("lookup"), Some("{\"q\":"));
        acc.ingest(Some(0), Some("call_real"), None, Some("\"x\"}"));
        let calls = acc.finalize();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "call_real");
        assert_eq!(calls[0].input, serde_json::json!({"q": "x"}));
    }

    #[test]
    fn drops_calls_whose_arguments_never_parse() {
        let mut acc = ToolCallAccumulator::new();
        acc.ingest(Some(0), Some("call_1"), Some("broken"), Some("{\"unterminated\":"));
        assert!(acc.finalize().is_empty());
    }

    #[test]
    fn keeps_parallel_calls_apart_by_index() {
        let mut acc = ToolCallAccumulator::new();
        acc.ingest(Some(0), Some("call_a"), Some("first"), None);
        acc.ingest(Some(1), Some("call_b"), Some("second"), None);
        acc.ingest(Some(0), None, None, Some("{}"));
        acc.ingest(Some(1), None, None, Some("{\"n\":1}"));
        let calls = acc.finalize();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].id, "call_a");
        assert_eq!(calls[0].input, serde_json::json!({}));
        assert_eq!(calls[1].id, "call_b");
        assert_eq!(calls[1].input, serde_json::json!({"n": 1}));
    }

    #[test]
    fn synthesizes_an_id_when_the_vendor_never_sends_one() {
        let mut acc = ToolCallAccumulator::new();
        acc.ingest(Some(2), None, Some("anon"), Some("{}"));
        let calls = acc.finalize();
        assert_eq!(calls[0].id, "call_2");
    }

    #[test]
    fn finalize_drains_so_a_second_call_is_empty() {
        let mut acc = ToolCallAccumulator::new();
        acc.ingest(Some(0), Some("call_1"), Some("f"), Some("{}"));
        assert_eq!(acc.finalize().len(), 1);
        assert!(acc.finalize().is_empty());
    }
}
