//! Lexer modes and the token rules each one tries.
//!
//! The scanner keeps a stack of [`Mode`]s. At every position it tries the
//! candidates of the mode on top of the stack; which candidate matched decides
//! the next [`Transition`]. Nothing else influences mode changes.

use serde::Serialize;

use crate::token::TokenKind;

/// A named tokenizing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Mode {
    /// Default mode: text, comments, tags and `{` openers.
    Content,
    /// Inside `<name ...>` or `</name ...>`.
    Tag,
    ScriptTag,
    ScriptContent,
    StyleTag,
    StyleContent,
    TextAreaTag,
    TextAreaContent,
    /// Inside a `"..."` attribute value.
    DoubleQuoted,
    /// Inside a `'...'` attribute value.
    SingleQuoted,
    /// Between `{` and its matching `}`.
    Expression,
}

const ATTRIBUTE_RULES: [TokenKind; 7] = [
    TokenKind::Equal,
    TokenKind::Pipe,
    TokenKind::LCurly,
    TokenKind::DQuote,
    TokenKind::SQuote,
    TokenKind::WhiteSpace,
    TokenKind::AttrText,
];

macro_rules! raw_tag_rules {
    ($r_angle:expr) => {
        [
            ATTRIBUTE_RULES[0],
            ATTRIBUTE_RULES[1],
            ATTRIBUTE_RULES[2],
            ATTRIBUTE_RULES[3],
            ATTRIBUTE_RULES[4],
            ATTRIBUTE_RULES[5],
            ATTRIBUTE_RULES[6],
            TokenKind::TextModeTagSelfClose,
            TokenKind::Slash,
            $r_angle,
        ]
    };
}

const CONTENT_RULES: &[TokenKind] = &[
    TokenKind::TextContent,
    TokenKind::LCurly,
    TokenKind::CommentTag,
    TokenKind::OpenStyleTag,
    TokenKind::OpenScriptTag,
    TokenKind::OpenTextAreaTag,
    TokenKind::OpenTag,
    TokenKind::CloseTag,
];

const TAG_RULES: &[TokenKind] = &[
    TokenKind::Slash,
    TokenKind::Colon,
    TokenKind::RAngle,
    ATTRIBUTE_RULES[0],
    ATTRIBUTE_RULES[1],
    ATTRIBUTE_RULES[2],
    ATTRIBUTE_RULES[3],
    ATTRIBUTE_RULES[4],
    ATTRIBUTE_RULES[5],
    ATTRIBUTE_RULES[6],
];

const SCRIPT_TAG_RULES: &[TokenKind] = &raw_tag_rules!(TokenKind::ScriptRAngle);
const STYLE_TAG_RULES: &[TokenKind] = &raw_tag_rules!(TokenKind::StyleRAngle);
const TEXTAREA_TAG_RULES: &[TokenKind] = &raw_tag_rules!(TokenKind::TextAreaRAngle);

const DOUBLE_QUOTED_RULES: &[TokenKind] = &[
    TokenKind::LCurly,
    TokenKind::DQuotedString,
    TokenKind::DQuoteEnd,
];

const SINGLE_QUOTED_RULES: &[TokenKind] = &[
    TokenKind::LCurly,
    TokenKind::SQuotedString,
    TokenKind::SQuoteEnd,
];

const EXPRESSION_RULES: &[TokenKind] = &[
    TokenKind::WhiteSpace,
    TokenKind::VoidBlock,
    TokenKind::BranchBlockOpen,
    TokenKind::BranchBlockContinue,
    TokenKind::BranchBlockEnd,
    TokenKind::ExprContent,
    TokenKind::RCurly,
];

impl Mode {
    /// Token kinds tried in this mode, highest priority first.
    ///
    /// The longest match wins; among equally long matches the earlier
    /// candidate wins.
    pub fn candidates(self) -> &'static [TokenKind] {
        match self {
            Mode::Content => CONTENT_RULES,
            Mode::Tag => TAG_RULES,
            Mode::ScriptTag => SCRIPT_TAG_RULES,
            Mode::ScriptContent => &[TokenKind::ScriptContentAndEndTag],
            Mode::StyleTag => STYLE_TAG_RULES,
            Mode::StyleContent => &[TokenKind::StyleContentAndEndTag],
            Mode::TextAreaTag => TEXTAREA_TAG_RULES,
            Mode::TextAreaContent => &[TokenKind::TextAreaContentAndEndTag],
            Mode::DoubleQuoted => DOUBLE_QUOTED_RULES,
            Mode::SingleQuoted => SINGLE_QUOTED_RULES,
            Mode::Expression => EXPRESSION_RULES,
        }
    }

    /// Raw-content modes consume everything up to their end tag in one token.
    pub fn is_raw_content(self) -> bool {
        matches!(
            self,
            Mode::ScriptContent | Mode::StyleContent | Mode::TextAreaContent
        )
    }
}

/// What happens to the mode stack after a token matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Stay,
    Push(Mode),
    Pop,
    /// Pop the current mode, then push another one.
    Replace(Mode),
}

impl TokenKind {
    /// The mode stack change caused by matching this kind.
    pub fn transition(self) -> Transition {
        match self {
            TokenKind::OpenTag | TokenKind::CloseTag => Transition::Push(Mode::Tag),
            TokenKind::RAngle => Transition::Pop,

            TokenKind::OpenScriptTag => Transition::Push(Mode::ScriptTag),
            TokenKind::ScriptRAngle => Transition::Replace(Mode::ScriptContent),
            TokenKind::OpenStyleTag => Transition::Push(Mode::StyleTag),
            TokenKind::StyleRAngle => Transition::Replace(Mode::StyleContent),
            TokenKind::OpenTextAreaTag => Transition::Push(Mode::TextAreaTag),
            TokenKind::TextAreaRAngle => Transition::Replace(Mode::TextAreaContent),
            TokenKind::ScriptContentAndEndTag
            | TokenKind::StyleContentAndEndTag
            | TokenKind::TextAreaContentAndEndTag
            | TokenKind::TextModeTagSelfClose => Transition::Pop,

            TokenKind::DQuote => Transition::Push(Mode::DoubleQuoted),
            TokenKind::SQuote => Transition::Push(Mode::SingleQuoted),
            TokenKind::DQuoteEnd | TokenKind::SQuoteEnd => Transition::Pop,

            TokenKind::LCurly => Transition::Push(Mode::Expression),
            TokenKind::RCurly => Transition::Pop,

            _ => Transition::Stay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_raw_tag_modes_share_attribute_rules() {
        for mode in [Mode::ScriptTag, Mode::StyleTag, Mode::TextAreaTag] {
            let candidates = mode.candidates();
            assert_eq!(&candidates[..ATTRIBUTE_RULES.len()], &ATTRIBUTE_RULES);
            assert!(candidates.contains(&TokenKind::TextModeTagSelfClose));
        }
    }

    #[test]
    fn test_self_close_outranks_slash_in_raw_tags() {
        let candidates = Mode::ScriptTag.candidates();
        let self_close = candidates
            .iter()
            .position(|k| *k == TokenKind::TextModeTagSelfClose);
        let slash = candidates.iter().position(|k| *k == TokenKind::Slash);
        assert!(self_close < slash);
    }

    #[test]
    fn test_only_raw_content_modes_are_raw() {
        assert!(Mode::StyleContent.is_raw_content());
        assert!(!Mode::StyleTag.is_raw_content());
        assert!(!Mode::Content.is_raw_content());
    }

    #[test]
    fn test_transitions() {
        assert_eq!(TokenKind::OpenTag.transition(), Transition::Push(Mode::Tag));
        assert_eq!(
            TokenKind::ScriptRAngle.transition(),
            Transition::Replace(Mode::ScriptContent)
        );
        assert_eq!(TokenKind::RCurly.transition(), Transition::Pop);
        assert_eq!(TokenKind::AttrText.transition(), Transition::Stay);
    }
}
