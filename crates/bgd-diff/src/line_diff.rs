//! Minimal line-level edit scripts (Myers).
//!
//! The greedy forward variant of Myers' algorithm, O((N+M)·D) where D is
//! the edit distance, producing a provably minimal sequence of
//! keep/add/remove operations over two line sequences. Used only for
//! rendering changed scripts; match decisions never depend on it.

use bgd_types::LineDiffSummary;

/// One operation in a line-level edit script.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineOp {
    /// The line is present on both sides.
    Keep(String),
    /// The line exists only on the new side.
    Add(String),
    /// The line exists only on the old side.
    Remove(String),
}

/// A contiguous run of changed lines, with 1-based starting line numbers
/// and line counts on both sides.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineHunk {
    pub old_start: usize,
    pub old_count: usize,
    pub new_start: usize,
    pub new_count: usize,
    pub lines: Vec<LineOp>,
}

/// A minimal edit script between two line sequences.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineDiff {
    pub ops: Vec<LineOp>,
}

impl LineDiff {
    /// Number of added lines.
    pub fn added(&self) -> usize {
        self.count(|op| matches!(op, LineOp::Add(_)))
    }

    /// Number of removed lines.
    pub fn removed(&self) -> usize {
        self.count(|op| matches!(op, LineOp::Remove(_)))
    }

    /// Number of kept lines.
    pub fn kept(&self) -> usize {
        self.count(|op| matches!(op, LineOp::Keep(_)))
    }

    /// Returns `true` if the two sides are identical.
    pub fn is_unchanged(&self) -> bool {
        self.added() == 0 && self.removed() == 0
    }

    fn count(&self, pred: impl Fn(&LineOp) -> bool) -> usize {
        self.ops.iter().filter(|op| pred(op)).count()
    }

    /// Group the edit script for display: a run of changes accumulates
    /// into a hunk, flushed as soon as a keep follows.
    pub fn hunks(&self) -> Vec<LineHunk> {
        let mut hunks = Vec::new();
        let mut current: Option<LineHunk> = None;
        // 1-based position of the next line on each side.
        let mut old_line = 1usize;
        let mut new_line = 1usize;

        for op in &self.ops {
            match op {
                LineOp::Keep(_) => {
                    if let Some(hunk) = current.take() {
                        hunks.push(hunk);
                    }
                    old_line += 1;
                    new_line += 1;
                }
                LineOp::Remove(_) => {
                    let hunk = current.get_or_insert_with(|| open_hunk(old_line, new_line));
                    hunk.old_count += 1;
                    hunk.lines.push(op.clone());
                    old_line += 1;
                }
                LineOp::Add(_) => {
                    let hunk = current.get_or_insert_with(|| open_hunk(old_line, new_line));
                    hunk.new_count += 1;
                    hunk.lines.push(op.clone());
                    new_line += 1;
                }
            }
        }
        if let Some(hunk) = current {
            hunks.push(hunk);
        }
        hunks
    }

    /// Render the changed lines as plain text, one hunk header per run.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for hunk in self.hunks() {
            out.push_str(&format!(
                "@@ -{},{} +{},{} @@\n",
                hunk.old_start, hunk.old_count, hunk.new_start, hunk.new_count
            ));
            for line in &hunk.lines {
                match line {
                    LineOp::Remove(text) => {
                        out.push_str("- ");
                        out.push_str(text);
                        out.push('\n');
                    }
                    LineOp::Add(text) => {
                        out.push_str("+ ");
                        out.push_str(text);
                        out.push('\n');
                    }
                    LineOp::Keep(_) => {}
                }
            }
        }
        out
    }

    /// The wire-format summary embedded in script-edit items.
    pub fn summary(&self) -> LineDiffSummary {
        LineDiffSummary {
            added: self.added(),
            removed: self.removed(),
            text: self.render(),
        }
    }
}

fn open_hunk(old_line: usize, new_line: usize) -> LineHunk {
    LineHunk {
        old_start: old_line,
        old_count: 0,
        new_start: new_line,
        new_count: 0,
        lines: Vec::new(),
    }
}

/// Compute the minimal edit script between two line sequences.
pub fn diff_lines(old: &[String], new: &[String]) -> LineDiff {
    LineDiff {
        ops: myers(old, new),
    }
}

fn myers(a: &[String], b: &[String]) -> Vec<LineOp> {
    let n = a.len() as isize;
    let m = b.len() as isize;
    let max = n + m;
    if max == 0 {
        return Vec::new();
    }

    let offset = max;
    let mut v = vec![0isize; (2 * max + 1) as usize];
    let mut trace: Vec<Vec<isize>> = Vec::new();

    'search: for d in 0..=max {
        trace.push(v.clone());
        let mut k = -d;
        while k <= d {
            let idx = (k + offset) as usize;
            let mut x = if k == -d || (k != d && v[idx - 1] < v[idx + 1]) {
                v[idx + 1]
            } else {
                v[idx - 1] + 1
            };
            let mut y = x - k;
            while x < n && y < m && a[x as usize] == b[y as usize] {
                x += 1;
                y += 1;
            }
            v[idx] = x;
            if x >= n && y >= m {
                break 'search;
            }
            k += 2;
        }
    }

    backtrack(a, b, &trace)
}

fn backtrack(a: &[String], b: &[String], trace: &[Vec<isize>]) -> Vec<LineOp> {
    let n = a.len() as isize;
    let m = b.len() as isize;
    let offset = n + m;
    let mut ops = Vec::new();
    let mut x = n;
    let mut y = m;

    for (d, v) in trace.iter().enumerate().rev() {
        let d = d as isize;
        let k = x - y;
        let idx = (k + offset) as usize;
        let prev_k = if k == -d || (k != d && v[idx - 1] < v[idx + 1]) {
            k + 1
        } else {
            k - 1
        };
        let prev_x = v[(prev_k + offset) as usize];
        let prev_y = prev_x - prev_k;

        while x > prev_x && y > prev_y {
            ops.push(LineOp::Keep(a[(x - 1) as usize].clone()));
            x -= 1;
            y -= 1;
        }
        if d > 0 {
            if x == prev_x {
                ops.push(LineOp::Add(b[(y - 1) as usize].clone()));
            } else {
                ops.push(LineOp::Remove(a[(x - 1) as usize].clone()));
            }
            x = prev_x;
            y = prev_y;
        }
    }

    ops.reverse();
    ops
}
