//! One study view with its reveal session and a judge per blank.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::time::{Duration, Instant};

use rand::Rng;
use serde::Serialize;
use tracing::debug;

use crate::corpus::{load_document, table_of_contents, Crumb, Document, Heading, Slug};
use crate::error::CorpusError;
use crate::quiz::{
    next_href, parse_fragments, placeholder, render_text, AnswerJudge, BlockSet, Fragment,
    InputOutcome, Pool, RatioControl, RevealSession, RevealState, Status, TokenView,
    DEFAULT_AUTOFILL_TRIGGER, DEFAULT_JUDGE_DELAY, DEFAULT_RATIO,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSettings {
    pub reveal_ratio: f64,
    pub judge_delay: Duration,
    pub autofill_trigger: char,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            reveal_ratio: DEFAULT_RATIO,
            judge_delay: DEFAULT_JUDGE_DELAY,
            autofill_trigger: DEFAULT_AUTOFILL_TRIGGER,
        }
    }
}

/// Header data of a page, as printed by the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct PageHeader<'a> {
    pub title: &'a str,
    pub slug: String,
    pub breadcrumbs: &'a [Crumb],
    pub toc: &'a [Heading],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_href: Option<&'a str>,
}

#[derive(Debug)]
pub struct StudyPage {
    document: Document,
    text: String,
    title: String,
    toc: Vec<Heading>,
    breadcrumbs: Vec<Crumb>,
    next_href: Option<String>,
    fragments: Vec<Fragment>,
    session: RevealSession,
    ratio: RatioControl,
    judges: BTreeMap<usize, AnswerJudge>,
    settings: PageSettings,
}

impl StudyPage {
    fn build(
        document: Document,
        text: String,
        next_href: Option<String>,
        state: RevealState,
        settings: PageSettings,
    ) -> Self {
        let title = document.display_title(&text);
        let toc = table_of_contents(&text);
        let breadcrumbs = document.slug.breadcrumbs();
        let fragments = parse_fragments(&text);
        let ratio = RatioControl::new(state.ratio());

        Self {
            document,
            text,
            title,
            toc,
            breadcrumbs,
            next_href,
            fragments,
            session: RevealSession::new(state),
            ratio,
            judges: BTreeMap::new(),
            settings,
        }
    }

    /// Whole-document study view.
    pub fn open_study(
        root: &Path,
        slug: &Slug,
        settings: PageSettings,
    ) -> Result<Self, CorpusError> {
        Self::open_study_seeded(root, slug, settings, RevealState::new(settings.reveal_ratio))
    }

    /// Whole-document view with an explicit initial reveal state.
    pub fn open_study_seeded(
        root: &Path,
        slug: &Slug,
        settings: PageSettings,
        state: RevealState,
    ) -> Result<Self, CorpusError> {
        let document = load_document(root, slug)?;
        let text = document.body.clone();
        Ok(Self::build(document, text, None, state, settings))
    }

    /// Random-study view: one problem block of the document plus the href of
    /// the next problem drawn from `pool`.
    pub fn open_random<R: Rng + ?Sized>(
        root: &Path,
        slug: &Slug,
        pool: &Pool,
        settings: PageSettings,
        rng: &mut R,
    ) -> Result<Self, CorpusError> {
        let document = load_document(root, slug)?;
        let text = BlockSet::from_content(&document.body).pick(rng).to_string();
        let next = next_href(pool, rng);
        debug!("random view of {}, next {}", slug, next);
        Ok(Self::build(
            document,
            text,
            Some(next),
            RevealState::new(settings.reveal_ratio),
            settings,
        ))
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The shown text: the body, or the picked block in random mode.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn toc(&self) -> &[Heading] {
        &self.toc
    }

    pub fn breadcrumbs(&self) -> &[Crumb] {
        &self.breadcrumbs
    }

    pub fn next_href(&self) -> Option<&str> {
        self.next_href.as_deref()
    }

    pub fn header(&self) -> PageHeader<'_> {
        PageHeader {
            title: &self.title,
            slug: self.document.path_label(),
            breadcrumbs: &self.breadcrumbs,
            toc: &self.toc,
            next_href: self.next_href.as_deref(),
        }
    }

    pub fn session(&self) -> &RevealSession {
        &self.session
    }

    pub fn ratio_control(&self) -> &RatioControl {
        &self.ratio
    }

    pub fn judge(&self, index: usize) -> Option<&AnswerJudge> {
        self.judges.get(&index)
    }

    /// Switch from the static first paint to the interactive view.
    pub fn mount(&mut self) {
        self.session.mount();
    }

    /// Render the current phase, creating a judge for every new blank and
    /// cancelling pending judges whose blank is no longer shown.
    pub fn render(&mut self) -> Vec<TokenView<'_>> {
        let views = self.session.render(&self.fragments);
        sync_judges(
            &mut self.judges,
            &views,
            self.session.state().reset_signal(),
            self.settings,
        );
        views
    }

    /// Indices of the blanks currently rendered, in document order.
    pub fn blanks(&mut self) -> Vec<usize> {
        self.render()
            .iter()
            .filter_map(|view| match view {
                TokenView::Blank { index, .. } => Some(*index),
                _ => None,
            })
            .collect()
    }

    pub fn input(&mut self, index: usize, raw: &str, now: Instant) -> Option<InputOutcome> {
        self.judges.get_mut(&index).map(|judge| judge.input(raw, now))
    }

    pub fn submit(&mut self, index: usize) -> Option<Status> {
        self.judges.get_mut(&index).map(AnswerJudge::submit)
    }

    pub fn toggle_answer(&mut self, index: usize) -> Option<bool> {
        self.judges.get_mut(&index).map(AnswerJudge::toggle_answer)
    }

    /// Run every timer that is due: debounced judges and a settled ratio
    /// commit. Returns the judges that fired.
    pub fn poll(&mut self, now: Instant) -> Vec<(usize, Status)> {
        if let Some(ratio) = self.ratio.poll(now) {
            self.session.set_ratio(ratio);
        }
        self.judges
            .iter_mut()
            .filter_map(|(index, judge)| judge.poll(now).map(|status| (*index, status)))
            .collect()
    }

    /// The earliest pending timer, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.judges
            .values()
            .filter_map(AnswerJudge::deadline)
            .chain(self.ratio.deadline())
            .min()
    }

    /// Schedule a ratio change; it takes effect after the settle delay.
    pub fn nudge_ratio(&mut self, ratio: f64, now: Instant) {
        self.ratio.nudge(ratio, now);
    }

    /// Apply a ratio right away. Assigned indices and judge state stay.
    pub fn set_ratio(&mut self, ratio: f64) {
        self.session.set_ratio(ratio);
        self.ratio.sync(self.session.state().ratio());
    }

    /// Reshuffle the page and clear every judge.
    pub fn reset(&mut self) -> u64 {
        let signal = self.session.reset();
        for judge in self.judges.values_mut() {
            judge.sync_reset(signal);
        }
        signal
    }

    /// Cancel every pending timer when the view goes away.
    pub fn unmount(&mut self) {
        self.ratio.cancel();
        for judge in self.judges.values_mut() {
            judge.cancel();
        }
    }

    /// Terminal rendering with each blank's input and verdict.
    pub fn render_text(&mut self) -> String {
        let views = self.session.render(&self.fragments);
        sync_judges(
            &mut self.judges,
            &views,
            self.session.state().reset_signal(),
            self.settings,
        );
        render_text(&views, |index, answer| match self.judges.get(&index) {
            Some(judge) => blank_label(index, judge),
            None => placeholder(index, answer),
        })
    }
}

fn sync_judges(
    judges: &mut BTreeMap<usize, AnswerJudge>,
    views: &[TokenView<'_>],
    signal: u64,
    settings: PageSettings,
) {
    let mut shown = BTreeSet::new();
    for view in views {
        if let TokenView::Blank { index, answer } = view {
            shown.insert(*index);
            judges.entry(*index).or_insert_with(|| {
                AnswerJudge::new(*answer, signal)
                    .with_delay(settings.judge_delay)
                    .with_trigger(settings.autofill_trigger)
            });
        }
    }
    for (index, judge) in judges.iter_mut() {
        if !shown.contains(index) {
            judge.cancel();
        }
    }
}

fn blank_label(index: usize, judge: &AnswerJudge) -> String {
    let mut label = if judge.value().is_empty() && judge.status() == Status::Default {
        placeholder(index, judge.answer())
    } else {
        let mark = match judge.status() {
            Status::Default => "",
            Status::Correct => " ok",
            Status::Wrong => " x",
        };
        format!("[{index}: {}{mark}]", judge.value())
    };
    if let Some(answer) = judge.revealed_answer() {
        label.push_str(&format!("({answer})"));
    }
    label
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::fs;
    use tempfile::TempDir;

    const DOC: &str = "---\ntitle: Terms\n---\n# Heading\n\nWords: `alpha`, `beta`, `gamma`.\n";

    fn corpus() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("a")).unwrap();
        fs::write(dir.path().join("a/terms.md"), DOC).unwrap();
        fs::write(
            dir.path().join("a/quiz.md"),
            "intro\n---\nQ1 `one`\n---\nQ2 `two`\n---\n",
        )
        .unwrap();
        dir
    }

    fn all_hidden() -> PageSettings {
        PageSettings {
            reveal_ratio: 0.0,
            ..PageSettings::default()
        }
    }

    #[test]
    fn test_open_study_header() {
        let dir = corpus();
        let page =
            StudyPage::open_study(dir.path(), &Slug::parse("a/terms"), PageSettings::default())
                .unwrap();
        assert_eq!(page.title(), "Terms");
        assert_eq!(page.toc().len(), 1);
        assert_eq!(page.breadcrumbs().len(), 1);
        assert_eq!(page.next_href(), None);
    }

    #[test]
    fn test_static_first_paint_has_no_judges() {
        let dir = corpus();
        let mut page =
            StudyPage::open_study(dir.path(), &Slug::parse("a/terms"), all_hidden()).unwrap();
        assert!(page.blanks().is_empty());
        assert!(page.render_text().contains("alpha"));

        page.mount();
        assert_eq!(page.blanks(), [1, 2, 3]);
        assert!(page.judge(1).is_some());
    }

    #[test]
    fn test_answer_flow() {
        let dir = corpus();
        let mut page =
            StudyPage::open_study(dir.path(), &Slug::parse("a/terms"), all_hidden()).unwrap();
        page.mount();
        page.blanks();

        let t0 = Instant::now();
        page.input(1, "alpha", t0);
        assert_eq!(page.next_deadline(), Some(t0 + DEFAULT_JUDGE_DELAY));
        assert!(page.poll(t0).is_empty());
        assert_eq!(page.poll(t0 + DEFAULT_JUDGE_DELAY), [(1, Status::Correct)]);

        page.input(2, "nope", t0);
        assert_eq!(page.submit(2), Some(Status::Wrong));
        assert_eq!(page.submit(9), None);

        let text = page.render_text();
        assert!(text.contains("[1: alpha ok]"));
        assert!(text.contains("[2: nope x]"));
        assert!(text.contains("[__3__]"));
    }

    #[test]
    fn test_reset_clears_judges() {
        let dir = corpus();
        let mut page =
            StudyPage::open_study(dir.path(), &Slug::parse("a/terms"), all_hidden()).unwrap();
        page.mount();
        page.blanks();
        let t0 = Instant::now();
        page.input(1, "alp", t0);
        page.toggle_answer(2);

        let seed = page.session().state().seed();
        page.reset();
        assert_ne!(page.session().state().seed(), seed);
        assert_eq!(page.judge(1).unwrap().value(), "");
        assert_eq!(page.judge(2).unwrap().revealed_answer(), None);
        assert_eq!(page.next_deadline(), None);
        assert_eq!(page.blanks(), [1, 2, 3]);
    }

    #[test]
    fn test_ratio_settles_then_applies() {
        let dir = corpus();
        let mut page =
            StudyPage::open_study(dir.path(), &Slug::parse("a/terms"), all_hidden()).unwrap();
        page.mount();
        assert_eq!(page.blanks().len(), 3);

        let t0 = Instant::now();
        page.nudge_ratio(1.0, t0);
        page.poll(t0);
        assert_eq!(page.blanks().len(), 3);
        page.poll(t0 + Duration::from_millis(50));
        assert!(page.blanks().is_empty());
    }

    #[test]
    fn test_unmount_cancels_pending_timers() {
        let dir = corpus();
        let mut page =
            StudyPage::open_study(dir.path(), &Slug::parse("a/terms"), all_hidden()).unwrap();
        page.mount();
        page.blanks();

        let t0 = Instant::now();
        page.input(1, "alp", t0);
        page.nudge_ratio(0.5, t0);
        assert!(page.next_deadline().is_some());

        page.unmount();
        assert_eq!(page.next_deadline(), None);
        assert!(page.poll(t0 + DEFAULT_JUDGE_DELAY).is_empty());
        assert_eq!(page.judge(1).unwrap().status(), Status::Default);
        assert_eq!(page.session().state().ratio(), 0.0);
    }

    #[test]
    fn test_shown_blank_drops_pending_judge() {
        let dir = corpus();
        let mut page =
            StudyPage::open_study(dir.path(), &Slug::parse("a/terms"), all_hidden()).unwrap();
        page.mount();
        page.blanks();

        let t0 = Instant::now();
        page.input(1, "alpha", t0);
        page.nudge_ratio(1.0, t0);
        page.poll(t0 + Duration::from_millis(50));
        assert!(page.blanks().is_empty());

        assert_eq!(page.next_deadline(), None);
        assert!(page.poll(t0 + DEFAULT_JUDGE_DELAY).is_empty());
    }

    #[test]
    fn test_open_random_picks_a_block() {
        let dir = corpus();
        let pool: Pool = ["a/quiz".to_string()].into_iter().collect();
        let mut rng = StdRng::seed_from_u64(3);
        let page = StudyPage::open_random(
            dir.path(),
            &Slug::parse("a/quiz"),
            &pool,
            PageSettings::default(),
            &mut rng,
        )
        .unwrap();
        assert!(["Q1 `one`", "Q2 `two`"].contains(&page.text()));
        assert!(page.next_href().unwrap().starts_with("/random/a/quiz?files="));
    }

    #[test]
    fn test_open_random_with_empty_pool_links_to_chooser() {
        let dir = corpus();
        let mut rng = StdRng::seed_from_u64(3);
        let page = StudyPage::open_random(
            dir.path(),
            &Slug::parse("a/terms"),
            &Pool::new(),
            PageSettings::default(),
            &mut rng,
        )
        .unwrap();
        assert_eq!(page.next_href(), Some("/random"));
        assert!(page.text().contains("`alpha`"));
    }
}
