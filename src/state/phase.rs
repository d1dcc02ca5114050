//! Traversal phase definitions for walking one category pair
//!
//! This module defines every phase the page traversal can be in and which
//! moves between them are legal.

use std::fmt;

/// Represents the current phase of a category-pair traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraversalPhase {
    // ===== Navigation =====
    /// Resolving the main category link on the home page
    LocateCategory,

    /// Resolving the subcategory link on the category page
    LocateSubcategory,

    // ===== Per-page loop =====
    /// Loading the current listing page
    FetchPage,

    /// Parsing the loaded listing page into entity stubs
    ExtractStubs,

    /// Capturing the detail page of each stub
    ProcessEntities,

    /// Following the rendered "next page" control
    NextPage,

    /// Speculatively loading numbered pages past the last rendered control
    ProbeAhead,

    // ===== Terminal =====
    /// Traversal for this pair is over
    Done,
}

impl TraversalPhase {
    /// Returns true if no further work happens in this phase
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Checks whether moving from this phase to `next` is legal
    ///
    /// Every phase may end the traversal. `ProbeAhead` re-enters the loop at
    /// `ExtractStubs` because a probe has already loaded its page.
    pub fn can_transition_to(&self, next: TraversalPhase) -> bool {
        use TraversalPhase::*;

        if next == Done {
            return !self.is_terminal();
        }

        matches!(
            (self, next),
            (LocateCategory, LocateSubcategory)
                | (LocateSubcategory, FetchPage)
                | (FetchPage, ExtractStubs)
                | (ExtractStubs, ProcessEntities)
                | (ProcessEntities, NextPage)
                | (ProcessEntities, ProbeAhead)
                | (NextPage, FetchPage)
                | (ProbeAhead, ExtractStubs)
        )
    }

    /// Converts the phase to its log/database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::LocateCategory => "locate_category",
            Self::LocateSubcategory => "locate_subcategory",
            Self::FetchPage => "fetch_page",
            Self::ExtractStubs => "extract_stubs",
            Self::ProcessEntities => "process_entities",
            Self::NextPage => "next_page",
            Self::ProbeAhead => "probe_ahead",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for TraversalPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

/// Why the traversal of a category pair ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// The captured count reached the pair's target
    TargetReached,

    /// A page produced no stubs at all
    Exhausted,

    /// Too many consecutive pages produced nothing new
    Saturated,

    /// No next control and no probed page produced anything new
    ProbeExhausted,
}

impl StopReason {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::TargetReached => "target_reached",
            Self::Exhausted => "exhausted",
            Self::Saturated => "saturated",
            Self::ProbeExhausted => "probe_exhausted",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
