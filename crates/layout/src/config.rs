use folio_types::Dimension;
use serde::{Deserialize, Serialize};

/// Knobs shared by every break search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BreakingConfig {
    /// Largest adjustment ratio a line or page may have and still be feasible.
    ///
    /// Defaults to `1.0`.
    pub tolerance: f64,
    /// Desired deviation from the optimal number of lines or pages. `0` picks the
    /// optimum, `+1` asks for one more line, `-1` for one fewer.
    pub looseness: i32,
    /// Constant added to the badness of every line before squaring.
    pub line_penalty: f64,
    /// Cost producers should give to hyphenation points (flagged penalties).
    ///
    /// Defaults to `50`.
    pub flagged_penalty: i32,
    /// Added when two consecutive breaks are both flagged.
    ///
    /// Defaults to `50.0`.
    pub repeated_flagged_demerit: f64,
    /// Added when adjacent lines are more than one fitness class apart.
    ///
    /// Defaults to `50.0`.
    pub incompatible_fitness_demerit: f64,
    /// Bounds the active set to `max(64, lookahead_factor * lines)` nodes.
    ///
    /// - **Higher values**: closer to the unbounded optimum, more memory.
    /// - **Lower values**: faster on very long flows, may miss the optimum.
    ///
    /// Defaults to `8`.
    pub lookahead_factor: usize,
}

impl Default for BreakingConfig {
    fn default() -> Self {
        Self {
            tolerance: 1.0,
            looseness: 0,
            line_penalty: 1.0,
            flagged_penalty: 50,
            repeated_flagged_demerit: 50.0,
            incompatible_fitness_demerit: 50.0,
            lookahead_factor: 8,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextAlign {
    Start,
    Center,
    End,
    #[default]
    Justify,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LineBreakingConfig {
    pub breaking: BreakingConfig,
    /// Tolerance of the second, hyphenating pass.
    ///
    /// Defaults to `20.0`.
    pub second_pass_tolerance: f64,
    /// Whether the second pass may break at flagged penalties.
    pub hyphenation: bool,
    pub text_align: TextAlign,
    /// Extra stretch every non-justified line gets, in millipoints.
    ///
    /// Defaults to `18000` (three ems of 6pt).
    pub ragged_stretch: i32,
}

impl Default for LineBreakingConfig {
    fn default() -> Self {
        Self {
            breaking: BreakingConfig::default(),
            second_pass_tolerance: 20.0,
            hyphenation: true,
            text_align: TextAlign::Justify,
            ragged_stretch: 18_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageBreakingConfig {
    pub breaking: BreakingConfig,
    /// Minimum number of lines of a paragraph left at the bottom of a page.
    pub orphans: usize,
    /// Minimum number of lines of a paragraph carried to the top of a page.
    pub widows: usize,
    pub orphan_demerits: f64,
    pub widow_demerits: f64,
    /// Share of a page's region height that may stay empty at adjustment ratio 1.
    ///
    /// Lets a page end short so keeps and orphan/widow control can move a
    /// break. `0.0` makes pages rigid: only exactly filled pages are feasible.
    ///
    /// Defaults to `0.5`.
    pub bottom_stretch: f64,
    /// Rule and spacing placed above the first footnote body of a page.
    pub footnote_separator: Dimension,
    /// Whether footnote bodies may move to a later page than their citation.
    pub allow_footnote_deferral: bool,
    /// Charged once per footnote body pushed past its citation page.
    ///
    /// Defaults to `10000.0`.
    pub deferred_footnote_demerits: f64,
    /// Whether a footnote body may be cut between two of its lines, the rest
    /// continuing on the next page.
    pub allow_footnote_split: bool,
    /// Charged for a page that ends in the middle of a footnote body.
    ///
    /// Defaults to `5000.0`.
    pub split_footnote_demerits: f64,
    /// How often the flow may be re-searched after a page master turned out
    /// smaller than assumed. Exceeding it is an error.
    ///
    /// Defaults to `4`.
    pub max_relayout_retries: usize,
}

impl Default for PageBreakingConfig {
    fn default() -> Self {
        Self {
            breaking: BreakingConfig {
                tolerance: 20.0,
                ..BreakingConfig::default()
            },
            orphans: 2,
            widows: 2,
            orphan_demerits: 5000.0,
            widow_demerits: 5000.0,
            bottom_stretch: 0.5,
            footnote_separator: Dimension::ZERO,
            allow_footnote_deferral: true,
            deferred_footnote_demerits: 10_000.0,
            allow_footnote_split: true,
            split_footnote_demerits: 5000.0,
            max_relayout_retries: 4,
        }
    }
}
