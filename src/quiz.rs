mod block;
mod judge;
mod pool;
mod ratio;
mod reveal;
mod spans;
mod view;

pub use block::{extract_blocks, pick_block, BlockSet, SEPARATOR};
pub use judge::{
    answers_match, normalize_answer, AnswerJudge, InputOutcome, Status, DEFAULT_AUTOFILL_TRIGGER,
    DEFAULT_JUDGE_DELAY,
};
pub use pool::{next, next_href, start, NavTarget, Pool, RANDOM_ROUTE};
pub use ratio::{RatioControl, SETTLE_DELAY};
pub use reveal::{
    hash01, hide_score, IndexArena, Phase, RevealSession, RevealState, DEFAULT_RATIO, INITIAL_SEED,
};
pub use spans::{parse_fragments, CodeSpan, Fragment};
pub use view::{placeholder, render_text, InteractiveView, StaticView, TokenView};
