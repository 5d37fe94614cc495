//! Literal VHDL aggregates for testbench constants.
//!
//! Arrays are written as positional aggregates `(0 => .., 1 => ..)`. Anything
//! above one dimension puts one entry per line, indented four spaces deeper
//! than the enclosing aggregate.

use ndarray::{ArrayView1, ArrayView2, ArrayView3};

pub const DEFAULT_WIDTH: u32 = 12;

const INDENT: &str = "    ";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Element {
    /// `to_unsigned(v, width)`
    Unsigned { width: u32 },
    /// `"0101.."` zero-padded to `width` bits
    LogicVector { width: u32 },
}

impl Default for Element {
    fn default() -> Self {
        Element::Unsigned {
            width: DEFAULT_WIDTH,
        }
    }
}

impl Element {
    pub fn literal(&self, value: u64) -> String {
        match *self {
            Element::Unsigned { width } => format!("to_unsigned({value}, {width})"),
            Element::LogicVector { width } => {
                let width = width as usize;
                format!("\"{value:0width$b}\"")
            }
        }
    }
}

pub fn aggregate1<T: Copy + Into<u64>>(values: ArrayView1<'_, T>, element: Element) -> String {
    let body = values
        .iter()
        .enumerate()
        .map(|(i, &v)| format!("{i} => {}", element.literal(v.into())))
        .collect::<Vec<_>>()
        .join(", ");
    format!("({body})")
}

pub fn aggregate2<T: Copy + Into<u64>>(
    values: ArrayView2<'_, T>,
    element: Element,
    indent: &str,
) -> String {
    multiline(
        values.outer_iter().map(|row| aggregate1(row, element)),
        indent,
    )
}

pub fn aggregate3<T: Copy + Into<u64>>(
    values: ArrayView3<'_, T>,
    element: Element,
    indent: &str,
) -> String {
    let inner = format!("{indent}{INDENT}");
    multiline(
        values
            .outer_iter()
            .map(|plane| aggregate2(plane, element, &inner)),
        indent,
    )
}

fn multiline(entries: impl Iterator<Item = String>, indent: &str) -> String {
    let body = entries
        .enumerate()
        .map(|(i, entry)| format!("{indent}{INDENT}{i} => {entry}"))
        .collect::<Vec<_>>()
        .join(",\n");
    format!("(\n{body}\n{indent})")
}

pub fn constant(name: &str, ty: &str, literal: &str) -> String {
    format!("constant {name} : {ty} := {literal};")
}

#[cfg(test)]
mod tests {
    use ndarray::{Array2, arr1, arr2, arr3};

    use super::*;

    #[test]
    fn element_literals() {
        assert_eq!(Element::default().literal(5), "to_unsigned(5, 12)");
        assert_eq!(
            Element::LogicVector { width: 10 }.literal(5),
            "\"0000000101\""
        );
        assert_eq!(Element::LogicVector { width: 2 }.literal(5), "\"101\"");
    }

    #[test]
    fn flat_aggregate_on_one_line() {
        let v = arr1(&[3u16, 7]);
        assert_eq!(
            aggregate1(v.view(), Element::Unsigned { width: 10 }),
            "(0 => to_unsigned(3, 10), 1 => to_unsigned(7, 10))"
        );
        assert_eq!(
            aggregate1(v.view(), Element::LogicVector { width: 4 }),
            "(0 => \"0011\", 1 => \"0111\")"
        );
    }

    #[test]
    fn matrix_aggregate_one_row_per_line() {
        let m = arr2(&[[1u64, 2], [3, 4]]);
        let expected = concat!(
            "(\n",
            "    0 => (0 => to_unsigned(1, 4), 1 => to_unsigned(2, 4)),\n",
            "    1 => (0 => to_unsigned(3, 4), 1 => to_unsigned(4, 4))\n",
            ")"
        );
        assert_eq!(aggregate2(m.view(), Element::Unsigned { width: 4 }, ""), expected);
    }

    #[test]
    fn cube_aggregate_nests_indentation() {
        let c = arr3(&[[[1u16], [0]], [[1], [1]]]);
        let expected = concat!(
            "(\n",
            "    0 => (\n",
            "        0 => (0 => \"1\"),\n",
            "        1 => (0 => \"0\")\n",
            "    ),\n",
            "    1 => (\n",
            "        0 => (0 => \"1\"),\n",
            "        1 => (0 => \"1\")\n",
            "    )\n",
            ")",
        );
        assert_eq!(
            aggregate3(c.view(), Element::LogicVector { width: 1 }, ""),
            expected
        );
    }

    #[test]
    fn empty_matrix_keeps_the_frame() {
        let m = Array2::<u16>::zeros((0, 3));
        assert_eq!(aggregate2(m.view(), Element::default(), ""), "(\n\n)");
    }

    #[test]
    fn constant_declaration() {
        assert_eq!(
            constant("averages", "averages_t", "(0 => to_unsigned(1, 10))"),
            "constant averages : averages_t := (0 => to_unsigned(1, 10));"
        );
    }
}
