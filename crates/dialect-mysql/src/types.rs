/// Pathological catalog rows have been seen carrying absurd lengths; anything
/// above this cap is clamped before rendering.
const LENGTH_CAP: u64 = 999_999;

/// Assembles the displayed datatype from the fragmented catalog columns:
/// base type plus character length or numeric precision/scale.
pub(crate) fn assemble_datatype(
    data_type: &str,
    char_length: Option<u64>,
    numeric_precision: Option<u64>,
    numeric_scale: Option<u64>,
) -> String {
    let base = data_type.trim().to_lowercase();

    if let Some(length) = char_length {
        return format!("{base}({})", length.min(LENGTH_CAP));
    }

    if uses_precision(&base) {
        if let Some(precision) = numeric_precision {
            let precision = precision.min(LENGTH_CAP);
            return match numeric_scale {
                Some(scale) if scale > 0 => format!("{base}({precision},{scale})"),
                _ => format!("{base}({precision})"),
            };
        }
    }

    base
}

/// Integer display widths were dropped in MySQL 8.0.19 and carry no semantic
/// weight, so precision is only rendered for exact numerics.
fn uses_precision(base: &str) -> bool {
    matches!(base, "decimal" | "numeric" | "dec" | "fixed")
}

pub(crate) fn is_auto_increment(extra: &str) -> bool {
    extra.to_lowercase().contains("auto_increment")
}

pub(crate) fn is_unsigned(column_type: &str) -> bool {
    column_type.to_lowercase().contains("unsigned")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn character_length_is_appended() {
        assert_eq!(
            assemble_datatype("varchar", Some(255), None, None),
            "varchar(255)"
        );
    }

    #[test]
    fn absurd_lengths_are_capped() {
        assert_eq!(
            assemble_datatype("varchar", Some(4_294_967_295), None, None),
            "varchar(999999)"
        );
    }

    #[test]
    fn decimal_renders_precision_and_scale() {
        assert_eq!(
            assemble_datatype("decimal", None, Some(10), Some(2)),
            "decimal(10,2)"
        );
        assert_eq!(
            assemble_datatype("decimal", None, Some(10), Some(0)),
            "decimal(10)"
        );
    }

    #[test]
    fn integers_keep_their_bare_type() {
        assert_eq!(assemble_datatype("int", None, Some(10), Some(0)), "int");
        assert_eq!(assemble_datatype("bigint", None, Some(19), None), "bigint");
    }

    #[test]
    fn auto_increment_detection_is_case_insensitive() {
        assert!(is_auto_increment("AUTO_INCREMENT"));
        assert!(is_auto_increment("auto_increment DEFAULT_GENERATED"));
        assert!(!is_auto_increment("VIRTUAL GENERATED"));
    }

    #[test]
    fn unsigned_detection_reads_column_type() {
        assert!(is_unsigned("int unsigned"));
        assert!(is_unsigned("DECIMAL(10,2) UNSIGNED"));
        assert!(!is_unsigned("int"));
    }
}
