//! Column dump of every visible flag.

use std::io::{self, Write};

use crate::core::{FlagType, FlagValue};
use crate::flags::{Bounds, FlagDef, FlagId};
use crate::registry::Registry;

/// What [`print_all`] includes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrintOptions {
	/// Append each flag's description.
	pub with_comments: bool,
	/// Print ranges instead of values; only numeric flags are listed.
	pub with_ranges: bool,
	/// Omit flags still at their default.
	pub skip_defaults: bool,
}

struct Columns {
	name: usize,
	value: usize,
	kind: usize,
	origin: usize,
	comment: usize,
}

const TYPE_WIDTH: usize = 9;
const KIND_WIDTH: usize = 20;
const RANGE_KIND_WIDTH: usize = 35;

const VALUE_COLUMNS: Columns = Columns {
	name: 10,
	value: 53,
	kind: 84,
	origin: 105,
	comment: 121,
};

const RANGE_COLUMNS: Columns = Columns {
	name: 10,
	value: 61,
	kind: 122,
	origin: 158,
	comment: 174,
};

/// Line buffer that pads to fixed columns.
#[derive(Default)]
struct Line(String);

impl Line {
	/// Pads to `column`, or adds one blank when the previous field overran.
	fn fill_to(&mut self, column: usize) {
		let width = self.0.chars().count();
		if width < column {
			self.0.extend(core::iter::repeat_n(' ', column - width));
		} else {
			self.0.push(' ');
		}
	}

	fn push(&mut self, text: &str) {
		self.0.push_str(text);
	}

	fn finish(&mut self, out: &mut impl Write) -> io::Result<()> {
		writeln!(out, "{}", self.0.trim_end())?;
		self.0.clear();
		Ok(())
	}
}

/// Writes every unlocked, non-constant flag sorted byte-wise by name.
pub fn print_all(registry: &Registry, out: &mut impl Write, options: PrintOptions) -> io::Result<()> {
	let table = registry.table();
	let mut ids: Vec<FlagId> = table.ids().collect();
	ids.sort_by(|a, b| table.def(*a).name.as_bytes().cmp(table.def(*b).name.as_bytes()));

	writeln!(
		out,
		"{}",
		if options.with_ranges {
			"[Global flags ranges]"
		} else {
			"[Global flags]"
		}
	)?;
	for id in ids {
		if !registry.is_unlocked(id) || registry.is_constant_in_binary(id) {
			continue;
		}
		if options.skip_defaults && registry.is_default(id) {
			continue;
		}
		if options.with_ranges {
			print_range_line(registry, id, out, options)?;
		} else {
			print_value_line(registry, id, out, options)?;
		}
	}
	Ok(())
}

fn print_value_line(
	registry: &Registry,
	id: FlagId,
	out: &mut impl Write,
	options: PrintOptions,
) -> io::Result<()> {
	let def = registry.table().def(id);
	let columns = VALUE_COLUMNS;
	let mut line = Line::default();
	line.push(&format!("{:>TYPE_WIDTH$}", def.flag_type().name()));
	line.fill_to(columns.name);
	line.push(def.name);
	line.fill_to(columns.value - 3);
	line.push(" =");
	line.fill_to(columns.value);

	let value = registry.raw(id).cloned().unwrap_or(FlagValue::Str(None));
	if let FlagValue::Str(Some(text)) = &value {
		// Every embedded newline continues the value on a `+=` line.
		let mut parts = text.split('\n');
		if let Some(first) = parts.next() {
			line.push(first);
		}
		for part in parts {
			line.finish(out)?;
			line.fill_to(columns.name);
			line.push(def.name);
			line.fill_to(columns.value - 3);
			line.push("+=");
			line.fill_to(columns.value);
			line.push(part);
		}
	} else {
		line.push(&value.to_string());
	}

	finish_line(registry, id, def, line, &columns, KIND_WIDTH, out, options)
}

fn print_range_line(
	registry: &Registry,
	id: FlagId,
	out: &mut impl Write,
	options: PrintOptions,
) -> io::Result<()> {
	let def = registry.table().def(id);
	let Some(bounds) = registry
		.table()
		.limit(id)
		.and_then(|limit| limit.bounds)
		.or_else(|| full_range(def.flag_type()))
	else {
		return Ok(());
	};
	let columns = RANGE_COLUMNS;
	let mut line = Line::default();
	line.push(&format!("{:>TYPE_WIDTH$}", def.flag_type().name()));
	line.fill_to(columns.name);
	line.push(def.name);
	line.fill_to(columns.value);
	line.push(&render_range(bounds));
	finish_line(registry, id, def, line, &columns, RANGE_KIND_WIDTH, out, options)
}

#[allow(clippy::too_many_arguments)]
fn finish_line(
	registry: &Registry,
	id: FlagId,
	def: &FlagDef,
	mut line: Line,
	columns: &Columns,
	kind_width: usize,
	out: &mut impl Write,
	options: PrintOptions,
) -> io::Result<()> {
	line.fill_to(columns.kind);
	line.push(&format!("{:>kind_width$}", def.kind.label()));
	line.fill_to(columns.origin);
	let provenance = registry.provenance(id).unwrap_or_default();
	line.push(&format!("{{{provenance}}}"));
	if options.with_comments {
		line.fill_to(columns.comment);
		line.push(def.doc);
	}
	line.finish(out)
}

/// Range of the storage type itself, shown for numeric flags without a range.
fn full_range(ty: FlagType) -> Option<Bounds> {
	Some(match ty {
		FlagType::Int => Bounds::Int(i32::MIN, i32::MAX),
		FlagType::Uint => Bounds::Uint(0, u32::MAX),
		FlagType::Intx => Bounds::Intx(isize::MIN, isize::MAX),
		FlagType::Uintx => Bounds::Uintx(0, usize::MAX),
		FlagType::Uint64 => Bounds::Uint64(0, u64::MAX),
		FlagType::SizeT => Bounds::SizeT(0, usize::MAX as u64),
		FlagType::Double => Bounds::Double(f64::MIN, f64::MAX),
		FlagType::Bool | FlagType::Ccstr | FlagType::CcstrList => return None,
	})
}

fn render_range(bounds: Bounds) -> String {
	match bounds {
		Bounds::Double(lo, hi) => format!("[ {lo:<25.3} ... {hi:>25.3} ]"),
		_ => format!(
			"[ {:<25} ... {:>25} ]",
			bounds.min_value().to_string(),
			bounds.max_value().to_string()
		),
	}
}
