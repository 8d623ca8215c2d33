/// Assembles the displayed datatype from sys.columns fragments.
///
/// NVARCHAR/NCHAR report their width in bytes with a two-byte encoding, so
/// the byte count is halved for display; `max_length = -1` is the unbounded
/// `(max)` form.
pub(crate) fn assemble_datatype(
    base: &str,
    max_length: i32,
    precision: i32,
    scale: i32,
) -> String {
    let base = base.trim().to_lowercase();
    match base.as_str() {
        "nvarchar" | "nchar" => {
            if max_length == -1 {
                format!("{base}(max)")
            } else {
                format!("{base}({})", (max_length / 2).max(1))
            }
        }
        "varchar" | "char" | "varbinary" | "binary" => {
            if max_length == -1 {
                format!("{base}(max)")
            } else {
                format!("{base}({})", max_length.max(1))
            }
        }
        "decimal" | "numeric" => {
            if precision > 0 {
                format!("{base}({},{})", precision, scale.max(0))
            } else {
                base
            }
        }
        "datetime2" | "time" | "datetimeoffset" => {
            if scale > 0 {
                format!("{base}({scale})")
            } else {
                base
            }
        }
        _ => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nvarchar_byte_width_is_halved() {
        assert_eq!(assemble_datatype("nvarchar", 510, 0, 0), "nvarchar(255)");
        assert_eq!(assemble_datatype("nchar", 20, 0, 0), "nchar(10)");
    }

    #[test]
    fn negative_one_means_max() {
        assert_eq!(assemble_datatype("nvarchar", -1, 0, 0), "nvarchar(max)");
        assert_eq!(assemble_datatype("varbinary", -1, 0, 0), "varbinary(max)");
    }

    #[test]
    fn single_byte_types_keep_their_byte_width() {
        assert_eq!(assemble_datatype("varchar", 255, 0, 0), "varchar(255)");
    }

    #[test]
    fn decimal_carries_precision_and_scale() {
        assert_eq!(assemble_datatype("decimal", 9, 10, 2), "decimal(10,2)");
        assert_eq!(assemble_datatype("decimal", 9, 0, 0), "decimal");
    }

    #[test]
    fn plain_types_pass_through_lowercased() {
        assert_eq!(assemble_datatype("INT", 4, 10, 0), "int");
        assert_eq!(assemble_datatype("datetime2", 8, 27, 0), "datetime2");
        assert_eq!(assemble_datatype("datetime2", 8, 27, 3), "datetime2(3)");
    }
}
