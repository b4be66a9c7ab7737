use rand::Rng;
use tracing::debug;

/// A line consisting solely of this token (after trimming) delimits blocks.
pub const SEPARATOR: &str = "---";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSet {
    blocks: Vec<String>,
    is_fallback: bool,
}

/// Non-empty texts between adjacent separator lines, in document order.
/// Empty when the text has fewer than two separators.
pub fn extract_blocks(content: &str) -> Vec<String> {
    let lines: Vec<&str> = content.lines().collect();
    let separators: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.trim() == SEPARATOR)
        .map(|(idx, _)| idx)
        .collect();

    separators
        .windows(2)
        .filter_map(|pair| {
            let block = lines[pair[0] + 1..pair[1]].join("\n");
            let block = block.trim();
            (!block.is_empty()).then(|| block.to_string())
        })
        .collect()
}

impl BlockSet {
    pub fn from_content(content: &str) -> Self {
        let blocks = extract_blocks(content);
        if blocks.is_empty() {
            return Self {
                blocks: vec![content.trim().to_string()],
                is_fallback: true,
            };
        }
        Self {
            blocks,
            is_fallback: false,
        }
    }

    pub fn blocks(&self) -> &[String] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// True when the document had no separator-delimited block.
    pub fn is_fallback(&self) -> bool {
        self.is_fallback
    }

    /// Uniformly pick one candidate.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> &str {
        let idx = rng.gen_range(0..self.blocks.len());
        debug!(
            "picked block {} of {} (fallback: {})",
            idx + 1,
            self.blocks.len(),
            self.is_fallback
        );
        &self.blocks[idx]
    }
}

/// Pick one problem block of `content`, or the whole trimmed body when it has none.
pub fn pick_block<R: Rng + ?Sized>(content: &str, rng: &mut R) -> String {
    BlockSet::from_content(content).pick(rng).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_stacked_blocks() {
        let blocks = extract_blocks("---\nQ1\n---\n---\nQ2\n---");
        assert_eq!(blocks, ["Q1", "Q2"]);
    }

    #[test]
    fn test_shared_separators() {
        let blocks = extract_blocks("intro\n---\nA\n---\nB\n---\noutro");
        assert_eq!(blocks, ["A", "B"]);
    }

    #[test]
    fn test_separator_is_trimmed_but_exact() {
        let blocks = extract_blocks("  ---  \nA\n----\nstill A\n---");
        assert_eq!(blocks, ["A\n----\nstill A"]);
    }

    #[test]
    fn test_blank_blocks_are_dropped() {
        let blocks = extract_blocks("---\n   \n\t\n---\nreal\n---");
        assert_eq!(blocks, ["real"]);
    }

    #[test]
    fn test_crlf_lines() {
        let blocks = extract_blocks("---\r\nline one\r\nline two\r\n---\r\n");
        assert_eq!(blocks, ["line one\nline two"]);
    }

    #[test]
    fn test_fallback_with_zero_or_one_separator() {
        let set = BlockSet::from_content("  whole body  \n");
        assert!(set.is_fallback());
        assert_eq!(set.blocks(), ["whole body"]);

        let set = BlockSet::from_content("\nabove\n---\nbelow\n");
        assert!(set.is_fallback());
        assert_eq!(set.blocks(), ["above\n---\nbelow"]);
    }

    #[test]
    fn test_fallback_when_all_blocks_blank() {
        let set = BlockSet::from_content("text\n---\n\n---");
        assert!(set.is_fallback());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let content = "---\nA\n---\n---\nB\n---\n---\nC\n---";
        let first = extract_blocks(content);
        for _ in 0..5 {
            assert_eq!(extract_blocks(content), first);
        }
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn test_pick_covers_every_block() {
        let set = BlockSet::from_content("---\nA\n---\nB\n---\nC\n---");
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(set.pick(&mut rng).to_string());
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_pick_block_fallback() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(pick_block("just text", &mut rng), "just text");
    }
}
