pub const GAP_PENALTY: i64 = 2;
pub const START_PENALTY: i64 = 1;

/// Inclusive character span of the winning alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchRange {
    pub start: usize,
    pub end: usize,
}

impl MatchRange {
    pub fn width(&self) -> usize {
        self.end - self.start
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchScore {
    pub score: i64,
    pub range: Option<MatchRange>,
}

impl MatchScore {
    pub const NO_MATCH: MatchScore = MatchScore {
        score: i64::MAX,
        range: None,
    };

    const NEUTRAL: MatchScore = MatchScore {
        score: 0,
        range: None,
    };

    pub fn is_match(&self) -> bool {
        self.score != i64::MAX
    }

    pub fn span_width(&self) -> usize {
        self.range.map(|range| range.width()).unwrap_or(0)
    }
}

/// A query folded once and scored against many candidates.
#[derive(Debug, Clone)]
pub struct PreparedQuery {
    chars: Vec<char>,
}

impl PreparedQuery {
    pub fn new(query: &str) -> Self {
        Self {
            chars: query.chars().map(fold_char).collect(),
        }
    }

    pub fn score(&self, candidate: &str) -> MatchScore {
        let Some(&first) = self.chars.first() else {
            return MatchScore::NEUTRAL;
        };

        let haystack: Vec<char> = candidate.chars().map(fold_char).collect();
        if haystack.len() < self.chars.len() {
            return MatchScore::NO_MATCH;
        }

        let mut best: Option<(i64, usize, MatchRange)> = None;
        for (start, &c) in haystack.iter().enumerate() {
            if c != first {
                continue;
            }
            let start_cost = START_PENALTY * start as i64;
            if best.is_some_and(|(cost, _, _)| start_cost > cost) {
                break;
            }

            let Some(end) = self.greedy_end(&haystack, start) else {
                // No completion from here means none from any later start.
                break;
            };

            let gaps = end + 1 - start - self.chars.len();
            let cost = GAP_PENALTY * gaps as i64 + start_cost;
            let better = match best {
                None => true,
                Some((best_cost, best_gaps, _)) => {
                    cost < best_cost || (cost == best_cost && gaps < best_gaps)
                }
            };
            if better {
                best = Some((cost, gaps, MatchRange { start, end }));
            }
        }

        match best {
            Some((score, _, range)) => MatchScore {
                score,
                range: Some(range),
            },
            None => MatchScore::NO_MATCH,
        }
    }

    fn greedy_end(&self, haystack: &[char], start: usize) -> Option<usize> {
        let mut position = start;
        for &needle in &self.chars[1..] {
            position += 1;
            position += haystack.get(position..)?.iter().position(|&c| c == needle)?;
        }
        Some(position)
    }
}

fn fold_char(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

pub fn score(query: &str, candidate: &str) -> MatchScore {
    PreparedQuery::new(query).score(candidate)
}
