use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use pretty_assertions::assert_eq;
use rstest::rstest;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

use super::*;
use crate::builtins::{
	AllocatePrefetchDistance, BackgroundCompilation, CICompilerCount, CompilationMode,
	CompileThreshold, CountCompiledCalls, HeapDumpPath, LoopStripMiningIter, MaxHeapFreeRatio,
	MinHeapFreeRatio, ReplayCompiles, TieredStopAtLevel, UseCompressedOops, UseCountedLoopSafepoints,
};
use crate::core::{ErrorCode, FlagDefault, FlagKind, LockedMessage, ValidationError};
use crate::flags::{Bounds, Check, ConstraintCx, FlagLimit, Violation};

fn registry() -> Registry {
	Registry::new(HostSetup::default())
}

fn validate_through(registry: &mut Registry, last: Phase) -> Result<(), ValidationError> {
	for phase in Phase::ALL.into_iter().filter(|phase| *phase <= last) {
		registry.validate_phase(phase)?;
	}
	Ok(())
}

struct ErrorEvents(Arc<AtomicUsize>);

impl<S: Subscriber> Layer<S> for ErrorEvents {
	fn on_event(&self, event: &Event<'_>, _cx: Context<'_, S>) {
		if *event.metadata().level() == Level::ERROR {
			self.0.fetch_add(1, Ordering::Relaxed);
		}
	}
}

/// Counts error events logged while `f` runs.
fn error_events(f: impl FnOnce()) -> usize {
	let count = Arc::new(AtomicUsize::new(0));
	let subscriber = tracing_subscriber::registry().with(ErrorEvents(Arc::clone(&count)));
	tracing::subscriber::with_default(subscriber, f);
	count.load(Ordering::Relaxed)
}

static SMALL: &[FlagDef] = &[
	FlagDef::new("Alpha", FlagDefault::Bool(true), FlagKind::PRODUCT, ""),
	FlagDef::new("Beta", FlagDefault::Uint64(7), FlagKind::PRODUCT, ""),
];

#[test]
fn typed_reads_check_the_declared_type() {
	let registry = registry();
	assert_eq!(registry.get::<isize>(CompileThreshold.id()), Ok(10000));
	let err = registry.get::<bool>(CompileThreshold.id()).unwrap_err();
	assert_eq!(err.code(), ErrorCode::WrongFormat);
	assert!(matches!(
		registry.get::<bool>(FlagId::new(u16::MAX)),
		Err(FlagError::InvalidFlag { .. })
	));
}

#[test]
fn set_returns_the_previous_value_and_records_origin() {
	let mut registry = registry();
	let old = registry
		.set(TieredStopAtLevel.id(), 1isize, Origin::CommandLine)
		.unwrap();
	assert_eq!(old, 4);
	assert_eq!(registry.value(TieredStopAtLevel), 1);
	assert_eq!(registry.origin(TieredStopAtLevel.id()), Some(Origin::CommandLine));
	assert!(!registry.is_default(TieredStopAtLevel.id()));
}

#[test]
fn command_line_bit_survives_later_writes() {
	let mut registry = registry();
	registry
		.set(CICompilerCount.id(), 4isize, Origin::CommandLine)
		.unwrap();
	registry.set_ergo(CICompilerCount, 3).unwrap();
	assert_eq!(registry.origin(CICompilerCount.id()), Some(Origin::Ergonomic));
	assert!(registry.was_set_on_command_line(CICompilerCount.id()));
	let provenance = registry.provenance(CICompilerCount.id()).unwrap();
	assert_eq!(provenance.to_string(), "command line, ergonomic");
}

#[test]
fn set_default_keeps_provenance() {
	let mut registry = registry();
	let old = registry
		.set_default(CICompilerCount.id(), FlagValue::Intx(3))
		.unwrap();
	assert_eq!(old, FlagValue::Intx(12));
	assert!(registry.is_default(CICompilerCount.id()));
	assert!(matches!(
		registry.set_default(CICompilerCount.id(), FlagValue::Bool(true)),
		Err(FlagError::WrongFormat { .. })
	));
}

#[test]
fn strings_are_handed_back_on_replace() {
	let mut registry = registry();
	let first = registry
		.set_string(HeapDumpPath.id(), Some("/a".into()), Origin::CommandLine)
		.unwrap();
	assert_eq!(first, None);
	let second = registry
		.set_string(HeapDumpPath.id(), Some("/b".into()), Origin::CommandLine)
		.unwrap();
	assert_eq!(second.as_deref(), Some("/a"));
	assert!(matches!(
		registry.append_string(HeapDumpPath.id(), "/c", Origin::CommandLine),
		Err(FlagError::WrongFormat { .. })
	));
}

#[test]
fn text_values_are_parsed_as_the_flag_type() {
	let mut registry = registry();
	registry
		.set_from_text("CICompilerCount", "6", Origin::CommandLine)
		.unwrap();
	assert_eq!(registry.value(CICompilerCount), 6);
	let err = registry
		.set_from_text("CICompilerCount", "abc", Origin::CommandLine)
		.unwrap_err();
	assert_eq!(
		err,
		FlagError::WrongFormat {
			name: "CICompilerCount".into(),
			detail: "'abc' is not a valid intx value".into(),
		}
	);
	registry
		.set_from_text("HeapDumpPath", "", Origin::CommandLine)
		.unwrap();
	assert_eq!(registry.value(HeapDumpPath), None);
	assert!(matches!(
		registry.set_from_value("CICompilerCount", FlagValue::Uintx(2), Origin::CommandLine),
		Err(FlagError::WrongFormat { .. })
	));
}

#[rstest]
#[case("", FlagError::MissingName)]
#[case(
	"TieredStopAtLevl",
	FlagError::InvalidFlag { name: "TieredStopAtLevl".into(), suggestion: Some("TieredStopAtLevel".into()) }
)]
#[case("Qqqq", FlagError::InvalidFlag { name: "Qqqq".into(), suggestion: None })]
#[case("ReplayCompile", FlagError::InvalidFlag { name: "ReplayCompile".into(), suggestion: None })]
fn lookup_for_mutation(#[case] name: &str, #[case] expected: FlagError) {
	assert_eq!(registry().find_for_mutation(name), Err(expected));
}

#[test]
fn locked_flags_are_suggested_only_when_allowed() {
	let registry = registry();
	assert_eq!(registry.fuzzy_find("ReplayCompile", true), Some(ReplayCompiles.id()));
	assert_eq!(registry.fuzzy_find("ReplayCompile", false), None);
	assert!(matches!(
		registry.find_for_mutation("ReplayCompiles"),
		Err(FlagError::Locked {
			reason: LockedMessage::DiagnosticLocked,
			..
		})
	));
}

#[test]
fn external_writers_need_manageable_flags() {
	let mut registry = registry();
	assert_eq!(
		registry.set(CICompilerCount.id(), 4isize, Origin::Management),
		Err(FlagError::NonWritable {
			name: "CICompilerCount".into()
		})
	);
	assert_eq!(
		registry.set(MaxHeapFreeRatio.id(), 80usize, Origin::AttachOnDemand),
		Ok(70)
	);
}

#[test]
fn startup_origins_are_rejected_after_seal() {
	let mut registry = registry();
	registry.seal();
	assert_eq!(
		registry.set(CICompilerCount.id(), 4isize, Origin::CommandLine),
		Err(FlagError::CommandLineOnly {
			name: "CICompilerCount".into()
		})
	);
	assert!(registry.set(HeapDumpPath.id(), Some("/x".to_string()), Origin::Management).is_ok());
	assert!(registry.set_ergo(CICompilerCount, 4).is_ok());
}

#[test]
fn trusted_origins_bypass_locks() {
	let mut registry = registry();
	assert!(matches!(
		registry.set(ReplayCompiles.id(), true, Origin::CommandLine),
		Err(FlagError::Locked { .. })
	));
	assert_eq!(registry.set_ergo(ReplayCompiles, true), Ok(false));
}

#[test]
fn default_origin_writes_are_gated() {
	let mut registry = registry();
	assert!(matches!(
		registry.set(ReplayCompiles.id(), true, Origin::Default),
		Err(FlagError::Locked { .. })
	));
	assert!(!registry.value(ReplayCompiles));

	registry.seal();
	assert_eq!(
		registry.set(CICompilerCount.id(), 11isize, Origin::Default),
		Err(FlagError::CommandLineOnly {
			name: "CICompilerCount".into()
		})
	);
	assert_eq!(registry.value(CICompilerCount), 12);
	assert!(registry.is_default(CICompilerCount.id()));
}

#[test]
fn rejected_internal_writes_are_not_reported_as_errors() {
	let mut registry = registry();
	registry.validate_phase(Phase::AtParse).unwrap();
	assert!(registry.verbose_checks_needed());

	let internal = error_events(|| {
		assert!(matches!(
			registry.set_ergo(TieredStopAtLevel, 9),
			Err(FlagError::OutOfBounds { .. })
		));
	});
	assert_eq!(internal, 0);

	let user = error_events(|| {
		assert!(matches!(
			registry.set(TieredStopAtLevel.id(), 9isize, Origin::CommandLine),
			Err(FlagError::OutOfBounds { .. })
		));
	});
	assert_eq!(user, 1);
}

#[test]
fn constants_cannot_change_at_all() {
	let mut registry = registry();
	assert!(registry.is_constant_in_binary(CountCompiledCalls.id()));
	assert_eq!(
		registry.set_ergo(CountCompiledCalls, true),
		Err(FlagError::Constant {
			name: "CountCompiledCalls".into()
		})
	);

	let mut narrow = Registry::new(HostSetup {
		lp64: false,
		..HostSetup::default()
	});
	assert!(matches!(
		narrow.set_ergo(UseCompressedOops, true),
		Err(FlagError::Constant { .. })
	));
}

#[test]
fn ranges_are_checked_on_every_write() {
	let mut registry = registry();
	let err = registry.set_ergo(TieredStopAtLevel, 5).unwrap_err();
	assert_eq!(err.code(), ErrorCode::OutOfBounds);
	assert_eq!(
		err.to_string(),
		"intx TieredStopAtLevel=5 is outside the allowed range [ 0 ... 4 ]\n"
	);
	assert_eq!(ErrorCode::of(&registry.set_ergo(TieredStopAtLevel, 3)), ErrorCode::Success);
}

#[test]
fn constraints_run_on_write_once_their_phase_is_reached() {
	let mut registry = registry();
	registry
		.set(MinHeapFreeRatio.id(), 80usize, Origin::CommandLine)
		.unwrap();
	assert_eq!(registry.value(MinHeapFreeRatio), 80);

	validate_through(&mut registry, Phase::AfterErgo).unwrap();
	assert_eq!(registry.value(MinHeapFreeRatio), 40);

	let err = registry
		.set(MinHeapFreeRatio.id(), 80usize, Origin::Management)
		.unwrap_err();
	assert_eq!(err.code(), ErrorCode::ViolatesConstraint);
	assert_eq!(registry.value(MinHeapFreeRatio), 40);
}

#[test]
fn phases_must_increase() {
	let mut registry = registry();
	registry.validate_phase(Phase::AfterErgo).unwrap();
	assert_eq!(
		registry.validate_phase(Phase::AtParse),
		Err(ValidationError::OutOfOrder {
			requested: Phase::AtParse,
			last: Phase::AfterErgo,
		})
	);
	assert_eq!(
		registry.validate_phase(Phase::AfterErgo),
		Err(ValidationError::OutOfOrder {
			requested: Phase::AfterErgo,
			last: Phase::AfterErgo,
		})
	);
	assert_eq!(registry.last_validated(), Some(Phase::AfterErgo));
}

#[test]
fn parse_phase_reports_every_failure() {
	let mut registry = registry();
	registry
		.set_from_text("CompilationMode", "bogus", Origin::CommandLine)
		.unwrap();
	registry
		.set_default(TieredStopAtLevel.id(), FlagValue::Intx(9))
		.unwrap();
	let Err(ValidationError::Failed(errors)) = registry.validate_phase(Phase::AtParse) else {
		panic!("parse phase should fail");
	};
	let codes: Vec<ErrorCode> = errors.iter().map(FlagError::code).collect();
	assert_eq!(codes, vec![ErrorCode::ViolatesConstraint, ErrorCode::OutOfBounds]);
	assert_eq!(registry.value(CompilationMode).as_deref(), Some("bogus"));
	assert_eq!(registry.value(TieredStopAtLevel), 9);
}

#[test]
fn later_phases_clamp_out_of_range_values() {
	let mut registry = registry();
	registry
		.set_default(AllocatePrefetchDistance.id(), FlagValue::Intx(1000))
		.unwrap();
	validate_through(&mut registry, Phase::AfterMemoryInit).unwrap();
	assert_eq!(registry.value(AllocatePrefetchDistance), 512);
}

#[test]
fn later_phases_reset_violations_to_the_default() {
	let mut registry = registry();
	registry
		.set_default(CICompilerCount.id(), FlagValue::Intx(-3))
		.unwrap();
	validate_through(&mut registry, Phase::AfterErgo).unwrap();
	assert_eq!(registry.value(CICompilerCount), 12);
}

#[test]
fn unresolved_prefetch_distance_fails_memory_phase() {
	let mut registry = registry();
	validate_through(&mut registry, Phase::AfterErgo).unwrap();
	assert!(matches!(
		registry.validate_phase(Phase::AfterMemoryInit),
		Err(ValidationError::Failed(errors)) if errors.len() == 1
	));
}

#[test]
fn soft_constraints_correct_the_value() {
	let mut registry = registry();
	registry
		.set(UseCountedLoopSafepoints.id(), false, Origin::CommandLine)
		.unwrap();
	validate_through(&mut registry, Phase::AfterErgo).unwrap();
	assert_eq!(registry.value(LoopStripMiningIter), 0);

	registry
		.set(LoopStripMiningIter.id(), 5usize, Origin::CommandLine)
		.unwrap();
	assert_eq!(registry.value(LoopStripMiningIter), 0);
}

#[test]
fn all_ranges_can_be_checked_at_once() {
	let mut registry = registry();
	assert_eq!(registry.check_all_ranges(false), Ok(()));
	registry
		.set_default(TieredStopAtLevel.id(), FlagValue::Intx(-1))
		.unwrap();
	assert!(matches!(
		registry.check_all_ranges(false),
		Err(ValidationError::Failed(errors)) if errors.len() == 1
	));
}

#[test]
fn compiled_mode_turns_off_interpreter_and_background_compilation() {
	let mut registry = registry();
	registry.set_exec_mode(ExecMode::Compiled);
	assert!(!registry.value(crate::builtins::UseInterpreter));
	assert!(!registry.value(BackgroundCompilation));
	assert!(registry.compiler().is_compile_only());
	registry.set_exec_mode(ExecMode::Mixed);
	assert!(registry.value(BackgroundCompilation));
}

#[test]
fn host_exec_mode_is_applied_at_construction() {
	let registry = Registry::new(HostSetup {
		exec_mode: ExecMode::Interpreted,
		..HostSetup::default()
	});
	assert!(registry.compiler().is_interpreter_only());
	assert!(!registry.value(crate::builtins::UseCompiler));
}

#[test]
fn compiler_mode_allows_two_assignments() {
	let mut registry = registry();
	registry.set_compiler_mode(CompilerMode::HighOnly).unwrap();
	registry.set_compiler_mode(CompilerMode::QuickOnly).unwrap();
	assert!(matches!(
		registry.set_compiler_mode(CompilerMode::Normal),
		Err(FlagError::SetOnlyOnce { .. })
	));
	assert_eq!(registry.compiler_mode(), CompilerMode::QuickOnly);
	assert_eq!(registry.mode_cell().assignments(), 2);
}

#[test]
fn custom_tables_get_their_own_slots() {
	let table: &'static FlagTable = Box::leak(Box::new(FlagTable::new(SMALL, &[], &[])));
	let mut registry = Registry::with_table(table, HostSetup::default());
	assert_eq!(registry.len(), 2);
	let beta = registry.find("Beta").unwrap();
	assert_eq!(registry.get::<u64>(beta), Ok(7));
	assert!(!registry.is_unlocker(beta));
	registry.set(beta, 9u64, Origin::CommandLine).unwrap();
	assert_eq!(registry.get::<u64>(beta), Ok(9));
	registry.set_exec_mode(ExecMode::Interpreted);
	assert_eq!(registry.get::<bool>(FlagId::new(0)), Ok(true));
}

fn at_most_two(cx: &ConstraintCx<'_>) -> Result<Check, Violation> {
	match cx.value::<isize>() {
		Some(value) if value > 2 => Err(Violation::new(format!("{} must be at most 2\n", cx.name()))),
		_ => Ok(Check::Pass),
	}
}

static GAMMA: &[FlagDef] = &[FlagDef::new("Gamma", FlagDefault::Intx(0), FlagKind::PRODUCT, "")];

static GAMMA_LIMITS: &[FlagLimit] = &[FlagLimit::new(FlagId::new(0))
	.range(Bounds::Intx(0, 4))
	.constraint(at_most_two, Phase::AtParse)];

#[test]
fn parse_validation_reports_range_and_constraint_together() {
	let table: &'static FlagTable = Box::leak(Box::new(FlagTable::new(GAMMA, GAMMA_LIMITS, &[])));
	let mut registry = Registry::with_table(table, HostSetup::default());
	let gamma = registry.find("Gamma").unwrap();
	registry.set_default(gamma, FlagValue::Intx(9)).unwrap();

	let Err(ValidationError::Failed(failures)) = registry.validate_phase(Phase::AtParse) else {
		panic!("expected validation failures");
	};
	let codes: Vec<ErrorCode> = failures.iter().map(FlagError::code).collect();
	assert_eq!(codes, vec![ErrorCode::OutOfBounds, ErrorCode::ViolatesConstraint]);
}
