//! Inline children → styled runs

use crate::block::StyledRun;
use crate::config::{BodyStyle, RunStyling};
use crate::token::{InlineChild, TokenKind};

/// Build one run per inline child, in order, in the body font.
///
/// In `Marker` styling a child is bold only when it is itself a
/// `strong_open` (likewise `em_open` → italics, `underline_open` →
/// underline), so the flags are mutually exclusive and text children are
/// plain. `Scoped` styling also applies every open marker to the children
/// that follow it, up to the matching close.
pub fn build_runs(children: &[InlineChild], style: &BodyStyle) -> Vec<StyledRun> {
    let mut scope = Scope::default();

    children
        .iter()
        .map(|child| {
            let text = child.content.clone().unwrap_or_default();
            let mut run = StyledRun::plain(text, &style.font, style.size_pt);

            match child.kind {
                TokenKind::StrongOpen => run.bold = true,
                TokenKind::EmOpen => run.italics = true,
                TokenKind::UnderlineOpen => run.underline = true,
                _ => {}
            }

            if style.styling == RunStyling::Scoped {
                scope.enter(child.kind);
                run.bold |= scope.bold > 0;
                run.italics |= scope.italics > 0;
                run.underline |= scope.underline > 0;
                scope.leave(child.kind);
            }

            run
        })
        .collect()
}

#[derive(Default)]
struct Scope {
    bold: usize,
    italics: usize,
    underline: usize,
}

impl Scope {
    fn enter(&mut self, kind: TokenKind) {
        match kind {
            TokenKind::StrongOpen => self.bold += 1,
            TokenKind::EmOpen => self.italics += 1,
            TokenKind::UnderlineOpen => self.underline += 1,
            _ => {}
        }
    }

    // A close marker is still inside its own scope, so it is applied after
    // the run has been styled.
    fn leave(&mut self, kind: TokenKind) {
        match kind {
            TokenKind::StrongClose => self.bold = self.bold.saturating_sub(1),
            TokenKind::EmClose => self.italics = self.italics.saturating_sub(1),
            TokenKind::UnderlineClose => self.underline = self.underline.saturating_sub(1),
            _ => {}
        }
    }
}
