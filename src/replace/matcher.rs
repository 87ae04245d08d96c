use crate::replace::ReplaceRule;

/// A match located in a paragraph and mapped back onto its runs.
///
/// `start`/`end` are byte offsets into the paragraph text; the run fields are
/// indexes into the paragraph's run list with offsets local to those runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub start: usize,
    pub end: usize,
    pub start_run: usize,
    pub start_offset: usize,
    pub end_run: usize,
    pub end_offset: usize,
}

impl Match {
    #[inline]
    pub fn spans_runs(&self) -> bool {
        self.start_run != self.end_run
    }
}

/// Find the first match at or after `cursor` in the concatenation of
/// `run_texts`.
///
/// The start run is the one whose text contains the first matched byte. The
/// end run is the one containing the last matched byte, so a match may end
/// exactly at a run's end but never begins or ends inside an empty run.
pub fn find_match<S: AsRef<str>>(run_texts: &[S], rule: &ReplaceRule, cursor: usize) -> Option<Match> {
    let text: String = run_texts.iter().map(AsRef::as_ref).collect();
    let start = rule.find_in(&text, cursor)?;
    let end = start + rule.search().len();

    let mut run_start = 0;
    let mut located: Option<(usize, usize)> = None;
    for (index, run) in run_texts.iter().enumerate() {
        let run_end = run_start + run.as_ref().len();
        if located.is_none() && start >= run_start && start < run_end {
            located = Some((index, start - run_start));
        }
        if let Some((start_run, start_offset)) = located
            && end > run_start
            && end <= run_end
        {
            return Some(Match {
                start,
                end,
                start_run,
                start_offset,
                end_run: index,
                end_offset: end - run_start,
            });
        }
        run_start = run_end;
    }
    None
}
