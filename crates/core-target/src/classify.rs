//! Pure, name-based section classification (§4.2). No I/O, no container
//! access — these functions only look at a section's name string.

/// The semantic classification of a section by name. `Memory`/`Other` are
/// not produced here: `Memory` comes from a section's flags (the
/// container parser's standard segment walk, see `memory.rs`), and `Other`
/// is simply "none of the name-based roles matched".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionRole {
    General { lwp: Option<u32> },
    Float { lwp: Option<u32> },
    Aux,
    StackCookie,
    Siginfo { lwp: Option<u32> },
    /// `SPU/<id>/<annex>` for any annex other than exactly `regs`.
    SpuContext { id: u32, annex: String },
    /// `SPU/<id>/regs` — contributes `<id>` to the enumerated SPU-id list.
    SpuRegs { id: u32 },
    Other,
}

/// Classify a section name. Exact-name matches take precedence over
/// prefix matches; `.reg` with no slash is never treated as a per-thread
/// section. Non-numeric LWP/SPU-id tails are "unrecognized" and fall
/// through to `Other`.
pub fn classify(name: &str) -> SectionRole {
    if name == ".reg" {
        return SectionRole::General { lwp: None };
    }
    if let Some(lwp) = strip_and_parse(name, ".reg/") {
        return SectionRole::General { lwp: Some(lwp) };
    }

    if name == ".reg2" {
        return SectionRole::Float { lwp: None };
    }
    if let Some(lwp) = strip_and_parse(name, ".reg2/") {
        return SectionRole::Float { lwp: Some(lwp) };
    }

    if name == ".auxv" {
        return SectionRole::Aux;
    }

    if name == ".wcookie" {
        return SectionRole::StackCookie;
    }

    if name == ".note.linuxcore.siginfo" {
        return SectionRole::Siginfo { lwp: None };
    }
    if let Some(lwp) = strip_and_parse(name, ".note.linuxcore.siginfo/") {
        return SectionRole::Siginfo { lwp: Some(lwp) };
    }

    if let Some(rest) = name.strip_prefix("SPU/") {
        if let Some((id_str, annex)) = rest.split_once('/') {
            if let Ok(id) = id_str.parse::<u32>() {
                return if annex == "regs" {
                    SectionRole::SpuRegs { id }
                } else {
                    SectionRole::SpuContext { id, annex: annex.to_string() }
                };
            }
        }
        return SectionRole::Other;
    }

    SectionRole::Other
}

fn strip_and_parse(name: &str, prefix: &str) -> Option<u32> {
    name.strip_prefix(prefix)?.parse().ok()
}

/// The effective section name for reading per-thread register/siginfo data:
/// `name/<lwp>` when the current thread carries a non-zero LWP, else
/// `name` unchanged.
pub fn effective_section_name(base: &str, lwp: u32) -> String {
    if lwp == 0 {
        base.to_string()
    } else {
        format!("{base}/{lwp}")
    }
}

/// Extracts the `<id>` from a `SPU/<id>/<annex>` name, for building the
/// `SPU/<annex>` lookup key used by `xfer(Spu, annex, ...)`.
pub fn spu_section_name(annex: &str) -> String {
    format!("SPU/{annex}")
}
