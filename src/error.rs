use crate::spec::Key;
use thiserror::Error;

/// Fatal conditions raised by the engine.
///
/// Every variant except [`Error::Parse`] aborts the current entry-point call
/// with the live tree left in whatever state the pass had reached; recovery
/// is the host's responsibility (typically a fresh `render` from scratch).
/// The markup serializer never raises these — it degrades failed subtrees to
/// an empty comment placeholder instead.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
	/// A spec shape that no virtual-node variant can represent in the
	/// current backend, e.g. a painter child outside the draw backend or a
	/// leave sentinel outside a component return position.
	#[error("cannot create node for spec: {what}")]
	UnsupportedSpec { what: &'static str },

	/// Two siblings under the same parent carry the same explicit key.
	#[error("duplicate key among siblings: {key:?}")]
	DuplicateKey { key: Key },

	/// A `key` prop that is neither an integer nor a string.
	#[error("key must be an integer or a string, found {found}")]
	BadKey { found: &'static str },

	/// A component triggered its own refresh before the render call that
	/// invoked it returned.
	#[error("refresh causes infinite loop")]
	RefreshLoop,

	/// `render`/`teardown`/`sync` was re-entered while a pass was active on
	/// the same differ.
	#[error("reconciliation already in progress on this differ")]
	Reentrant,

	/// An operation that requires a single element got something else.
	#[error("{what} requires a single element, found {found}")]
	NotAnElement {
		what: &'static str,
		found: &'static str,
	},

	/// Component unboxing recursed past the engine's depth cap, which in
	/// practice means a component (directly or indirectly) returns itself.
	#[error("component unboxing exceeded {limit} levels")]
	DepthLimit { limit: usize },

	/// The markup fragment parser hit input it cannot represent.
	#[error("markup parse error at byte {at}: {what}")]
	Parse { at: usize, what: &'static str },
}
