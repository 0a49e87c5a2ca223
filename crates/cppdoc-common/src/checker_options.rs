//! Configuration carried by the driving `ParsingArguments` value (spec §6).

/// The calling convention attached to function types parsed from `extern`
/// declarations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CallingConvention {
    #[default]
    None,
    Cdecl,
    Stdcall,
    Fastcall,
    Thiscall,
}

/// Configuration options threaded through type evaluation (C4) and
/// expression evaluation (C5), mirroring the original `TypeToTsysConfig`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CheckerOptions {
    /// On id-expression resolution, return `DeclInstant` when applicable.
    pub id_expr_to_instant: bool,
    /// Lift the type through a `Member` constructor when forming a
    /// pointer-to-member.
    pub member_of: bool,
    /// Calling convention to attach to function types.
    pub cc: CallingConvention,
}

impl Default for CheckerOptions {
    fn default() -> Self {
        CheckerOptions { id_expr_to_instant: true, member_of: false, cc: CallingConvention::None }
    }
}

impl CheckerOptions {
    /// Suppress `DeclInstant` lifting so a bare template-id is kept generic
    /// (used when parsing a context that expects a template, not an
    /// instantiation, e.g. `template<typename T> using X = Y<T>;`).
    pub fn expect_template() -> Self {
        CheckerOptions { id_expr_to_instant: false, ..Default::default() }
    }

    pub fn member_of(member_of: bool) -> Self {
        CheckerOptions { member_of, ..Default::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expect_template_disables_instant_lifting() {
        let opts = CheckerOptions::expect_template();
        assert!(!opts.id_expr_to_instant);
        assert!(!opts.member_of);
    }
}
