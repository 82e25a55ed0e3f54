use pretty_assertions::assert_eq;
use rstest::rstest;
use vmflags_registry::bytesize::ByteSize;
use vmflags_registry::keys::*;
use vmflags_registry::{Backends, ExecMode, FlagId, FlagScalar, HostSetup, Origin, Phase};

use super::*;

const M: u64 = 1024 * 1024;

fn host(backends: Backends) -> Registry {
	Registry::new(HostSetup::default().with_backends(backends))
}

fn user<T: FlagScalar>(registry: &mut Registry, key: TypedFlagKey<T>, value: T) {
	registry.set(key.id(), value, Origin::CommandLine).unwrap();
}

fn run(registry: &mut Registry) -> ErgoReport {
	Ergonomics::new(registry).run().unwrap()
}

#[test]
fn light_only_host_runs_quick_only() {
	let mut registry = host(Backends::LIGHT);
	let report = run(&mut registry);

	assert_eq!(report.mode, CompilerMode::QuickOnly);
	assert_eq!(registry.compiler_mode(), CompilerMode::QuickOnly);
	assert!(report.warnings.is_empty());
	assert!(!registry.value(ProfileInterpreter));
	assert_eq!(registry.value(CICompilerCount), 1);
	assert_eq!(registry.value(ReservedCodeCacheSize), ByteSize(32 * M));
	assert_eq!(registry.value(ProfiledCodeHeapSize), ByteSize(0));
	assert!(!registry.value(CICompilerCountPerCPU));
	assert!(registry.compiler().is_light_only());
}

#[test]
fn heavy_alt_without_tiering_skips_intermediate_tiers() {
	let mut registry = host(Backends::all());
	user(&mut registry, UnlockExperimentalVMOptions, true);
	user(&mut registry, EnableJVMCI, true);
	user(&mut registry, UseJVMCICompiler, true);
	user(&mut registry, TieredCompilation, false);
	let report = run(&mut registry);

	assert_eq!(report.mode, CompilerMode::HighOnlyQuickInternal);
	assert_eq!(report.warnings.len(), 1);
	assert!(report.warnings[0].contains("heavy-alternate compiler is not recommended"));
	assert!(registry.compiler().is_heavy_alt_compiler_only());
	assert_eq!(registry.value(Tier0ProfilingStartPercentage), 33);
	assert_eq!(registry.value(Tier3InvocationThreshold), 5000);
	assert_eq!(registry.value(Tier3CompileThreshold), 10000);
	assert_eq!(registry.value(Tier3BackEdgeThreshold), 15000);
}

#[test]
fn legacy_thresholds_map_onto_tier_three() {
	let mut registry = host(Backends::LIGHT);
	user(&mut registry, CompileThreshold, 10000);
	user(&mut registry, InterpreterProfilePercentage, 10);
	let osr_percentage = registry.value(OnStackReplacePercentage);
	run(&mut registry);

	assert_eq!(registry.value(Tier3InvocationThreshold), 10000);
	assert_eq!(registry.value(Tier3MinInvocationThreshold), 10000);
	assert_eq!(registry.value(Tier3CompileThreshold), 10000);
	assert_eq!(registry.value(Tier3BackEdgeThreshold), 10000 * osr_percentage / 100);
	assert_eq!(registry.value(Tier3BackEdgeThreshold), 93300);
	assert_eq!(registry.value(Tier0InvokeNotifyFreqLog), 7);
	assert_eq!(registry.origin(Tier3InvocationThreshold.id()), Some(Origin::Ergonomic));
}

#[test]
fn legacy_thresholds_map_onto_tier_four_without_tiering() {
	let mut registry = host(Backends::LIGHT | Backends::HEAVY);
	user(&mut registry, TieredCompilation, false);
	user(&mut registry, CompileThreshold, 2000);
	let report = run(&mut registry);

	assert_eq!(report.mode, CompilerMode::HighOnly);
	assert_eq!(registry.value(Tier4InvocationThreshold), 660);
	assert_eq!(registry.value(Tier4CompileThreshold), 660);
	assert_eq!(registry.value(Tier4BackEdgeThreshold), 924);
	assert_eq!(registry.value(Tier0ProfilingStartPercentage), 33);
	assert_eq!(registry.value(Tier3InvocationThreshold), 660);
	assert_eq!(registry.value(Tier3BackEdgeThreshold), 924);
	assert_eq!(registry.value(Tier0BackedgeNotifyFreqLog), 10);
}

#[test]
fn tiered_policy_ignores_legacy_thresholds() {
	let mut registry = host(Backends::LIGHT | Backends::HEAVY);
	user(&mut registry, CompileThreshold, 2000);
	let report = run(&mut registry);

	assert_eq!(report.mode, CompilerMode::Normal);
	assert_eq!(registry.value(Tier3InvocationThreshold), 200);
	assert_eq!(registry.value(Tier4InvocationThreshold), 5000);
}

#[test]
fn tiered_hosts_grow_the_code_cache() {
	let mut registry = host(Backends::LIGHT | Backends::HEAVY);
	let report = run(&mut registry);

	assert_eq!(report.mode, CompilerMode::Normal);
	assert!(report.warnings.is_empty());
	assert!(registry.compiler().is_tiered());
	assert_eq!(registry.value(ReservedCodeCacheSize), ByteSize(240 * M));
	assert!(registry.value(SegmentedCodeCache));
	assert_eq!(registry.value(CICompilerCount), 2);
	assert_eq!(registry.value(InlineSmallCode), 2500);
	assert_eq!(registry.value(C1InlineStackLimit), 5);
	assert!(registry.is_default(C1InlineStackLimit.id()));
	assert_eq!(
		report.adjustment("ReservedCodeCacheSize"),
		Some(&Adjustment {
			flag: "ReservedCodeCacheSize",
			old: FlagValue::SizeT(ByteSize(48 * M)),
			new: FlagValue::SizeT(ByteSize(240 * M)),
		})
	);
}

#[test]
fn explicit_code_cache_size_is_kept() {
	let mut registry = host(Backends::LIGHT | Backends::HEAVY);
	user(&mut registry, ReservedCodeCacheSize, ByteSize(64 * M));
	run(&mut registry);

	assert_eq!(registry.value(ReservedCodeCacheSize), ByteSize(64 * M));
	assert!(!registry.value(SegmentedCodeCache));
}

#[test]
fn scaling_rescales_every_threshold() {
	let mut registry = host(Backends::LIGHT | Backends::HEAVY);
	user(&mut registry, CompileThresholdScaling, 0.5);
	run(&mut registry);

	assert_eq!(registry.value(CompileThreshold), 5000);
	assert_eq!(registry.value(Tier3InvocationThreshold), 100);
	assert_eq!(registry.value(Tier4BackEdgeThreshold), 20000);
	assert_eq!(registry.value(Tier0InvokeNotifyFreqLog), 6);
	assert_eq!(registry.value(Tier23InlineeNotifyFreqLog), 19);
}

#[test]
fn scaled_frequency_logs_are_clamped_to_their_range() {
	let mut registry = host(Backends::LIGHT | Backends::HEAVY);
	user(&mut registry, CompileThresholdScaling, 1e9);
	run(&mut registry);

	assert_eq!(registry.value(Tier23InlineeNotifyFreqLog), 30);
	assert_eq!(registry.value(Tier3BackEdgeThreshold), MAX_JINT);
}

#[test]
fn zero_scaling_means_interpreter_only() {
	let mut registry = host(Backends::LIGHT | Backends::HEAVY);
	user(&mut registry, CompileThresholdScaling, 0.0);
	let report = run(&mut registry);

	assert_eq!(registry.exec_mode(), ExecMode::Interpreted);
	assert!(registry.compiler().is_interpreter_only());
	assert!(!registry.value(UseCompiler));
	assert!(!registry.value(TieredCompilation));
	assert!(!registry.value(ProfileInterpreter));
	assert_eq!(registry.value(CompileThreshold), 10000);
	assert_eq!(registry.value(Tier3InvocationThreshold), 200);
	assert_eq!(report.mode, CompilerMode::Normal);
}

#[test]
fn zero_threshold_without_tiering_means_interpreter_only() {
	let mut registry = host(Backends::LIGHT | Backends::HEAVY);
	user(&mut registry, TieredCompilation, false);
	user(&mut registry, CompileThreshold, 0);
	run(&mut registry);

	assert_eq!(registry.exec_mode(), ExecMode::Interpreted);
}

#[test]
fn negative_scaling_is_fatal() {
	let mut registry = host(Backends::LIGHT | Backends::HEAVY);
	user(&mut registry, CompileThresholdScaling, -1.0);
	let err = Ergonomics::new(&mut registry).run().unwrap_err();

	assert_eq!(err, ErgoError::NegativeScaling { value: -1.0 });
	assert_eq!(err.to_string(), "Negative value specified for CompileThresholdScaling");
}

#[test]
fn compile_only_notifies_immediately() {
	let mut registry = host(Backends::LIGHT | Backends::HEAVY);
	registry.set_exec_mode(ExecMode::Compiled);
	run(&mut registry);

	assert_eq!(registry.value(Tier3InvokeNotifyFreqLog), 0);
	assert_eq!(registry.value(Tier4InvocationThreshold), 0);
	assert!(!registry.value(BackgroundCompilation));
}

#[rstest]
#[case::high_only("high-only", Backends::LIGHT | Backends::HEAVY, CompilerMode::HighOnly)]
#[case::quick_only("quick-only", Backends::LIGHT | Backends::HEAVY, CompilerMode::QuickOnly)]
#[case::normal("normal", Backends::LIGHT | Backends::HEAVY, CompilerMode::Normal)]
#[case::refined("default", Backends::HEAVY, CompilerMode::HighOnly)]
fn explicit_modes(#[case] text: &str, #[case] backends: Backends, #[case] expected: CompilerMode) {
	let mut registry = host(backends);
	registry.set_from_text("CompilationMode", text, Origin::CommandLine).unwrap();
	let report = run(&mut registry);

	assert_eq!(report.mode, expected);
	assert!(report.warnings.is_empty(), "{:?}", report.warnings);
}

#[rstest]
#[case::no_light(
	"quick-only",
	Backends::HEAVY,
	"quick-only compilation mode unavailable because there is no light backend present."
)]
#[case::no_alt_compiler(
	"high-only-quick-internal",
	Backends::LIGHT | Backends::HEAVY,
	"high-only-quick-internal compilation mode unavailable because there is no light backend and heavy-alternate compiler present."
)]
#[case::unknown("bogus", Backends::LIGHT | Backends::HEAVY, "Unsupported compilation mode 'bogus', using default")]
fn unavailable_modes_warn(#[case] text: &str, #[case] backends: Backends, #[case] warning: &str) {
	let mut registry = host(backends);
	registry.set_from_text("CompilationMode", text, Origin::CommandLine).unwrap();
	let report = run(&mut registry);

	assert_eq!(report.warnings.first().map(String::as_str), Some(warning));
}

#[test]
fn high_only_installs_intermediate_free_thresholds() {
	let mut registry = host(Backends::LIGHT | Backends::HEAVY);
	registry
		.set_from_text("CompilationMode", "high-only", Origin::CommandLine)
		.unwrap();
	user(&mut registry, Tier4CompileThreshold, 12000);
	run(&mut registry);

	assert_eq!(registry.value(Tier4InvocationThreshold), 5000);
	assert_eq!(registry.value(Tier4CompileThreshold), 12000);
	assert_eq!(registry.value(Tier3CompileThreshold), 12000);
	assert_eq!(registry.value(Tier3MinInvocationThreshold), 600);
	assert!(registry.is_default(Tier3CompileThreshold.id()));
}

#[test]
fn never_server_class_forces_client_emulation() {
	let mut registry = host(Backends::LIGHT | Backends::HEAVY);
	user(&mut registry, NeverActAsServerClassMachine, true);
	let report = run(&mut registry);

	assert_eq!(report.mode, CompilerMode::QuickOnly);
	assert_eq!(registry.value(ReservedCodeCacheSize), ByteSize(32 * M));
	assert_eq!(registry.value(MaxRAM), 1024 * M);
	assert!(registry.is_default(MaxRAM.id()));
	assert!(!registry.value(ProfileInterpreter));
}

#[test]
fn mode_is_frozen_after_the_run() {
	let mut registry = host(Backends::LIGHT);
	run(&mut registry);

	assert!(registry.mode_cell().is_frozen());
	assert!(registry.set_compiler_mode(CompilerMode::HighOnly).is_err());
}

#[test]
fn loop_counters_follow_on_stack_replacement() {
	let mut registry = host(Backends::LIGHT | Backends::HEAVY);
	user(&mut registry, UseLoopCounter, false);
	let report = run(&mut registry);

	assert!(registry.value(UseLoopCounter));
	assert_eq!(
		report.warnings,
		vec!["On-stack-replacement requires loop counters; enabling loop counters".to_string()]
	);
}

#[test]
fn disabling_counted_safepoints_disables_strip_mining() {
	let mut registry = host(Backends::LIGHT | Backends::HEAVY);
	user(&mut registry, UseCountedLoopSafepoints, false);
	let report = run(&mut registry);

	assert_eq!(registry.value(LoopStripMiningIter), 0);
	assert_eq!(registry.value(LoopStripMiningIterShortLoop), 0);
	assert_eq!(report.warnings.len(), 1);
	assert!(report.warnings[0].starts_with("Disabling counted safepoints"));
}

#[test]
fn short_loop_strip_mining_follows_the_iteration_count() {
	let mut registry = host(Backends::LIGHT | Backends::HEAVY);
	user(&mut registry, LoopStripMiningIter, 500);
	run(&mut registry);

	assert_eq!(registry.value(LoopStripMiningIterShortLoop), 50);
}

#[test]
fn heavy_follow_ups() {
	let mut registry = host(Backends::LIGHT | Backends::HEAVY);
	user(&mut registry, EliminateLocks, false);
	user(&mut registry, Inline, false);
	user(&mut registry, UseTypeSpeculation, false);
	user(&mut registry, OptoLoopAlignment, 8);
	run(&mut registry);

	assert!(!registry.value(EliminateNestedLocks));
	assert!(!registry.value(IncrementalInline));
	assert!(!registry.value(IncrementalInlineVirtual));
	assert_eq!(registry.value(TypeProfileLevel), 0);
	assert_eq!(registry.value(MaxLoopPad), 7);
}

#[test]
fn replay_disables_background_compilation() {
	let mut registry = host(Backends::LIGHT | Backends::HEAVY);
	user(&mut registry, UnlockDiagnosticVMOptions, true);
	user(&mut registry, ReplayCompiles, true);
	let report = run(&mut registry);

	assert!(!registry.value(BackgroundCompilation));
	assert!(report.warnings.is_empty());
}

#[test]
fn explicit_compiler_count_turns_off_per_cpu_sizing() {
	let mut registry = host(Backends::LIGHT | Backends::HEAVY);
	user(&mut registry, CICompilerCount, 4);
	let report = run(&mut registry);

	assert_eq!(registry.value(CICompilerCount), 4);
	assert!(!registry.value(CICompilerCountPerCPU));
	assert!(report.warnings.is_empty());
}

#[test]
fn per_cpu_sizing_overrides_an_explicit_count() {
	let mut registry = Registry::new(HostSetup::default().with_processors(16));
	user(&mut registry, CICompilerCount, 4);
	user(&mut registry, CICompilerCountPerCPU, true);
	let report = run(&mut registry);

	assert_eq!(registry.value(CICompilerCount), 12);
	assert_eq!(
		report.warnings,
		vec!["The VM option CICompilerCountPerCPU overrides CICompilerCount.".to_string()]
	);
}

#[test]
fn user_profiling_in_quick_only_mode_is_disabled() {
	let mut registry = host(Backends::LIGHT | Backends::HEAVY);
	registry
		.set_from_text("CompilationMode", "quick-only", Origin::CommandLine)
		.unwrap();
	user(&mut registry, ProfileInterpreter, true);
	let report = run(&mut registry);

	assert!(!registry.value(ProfileInterpreter));
	assert_eq!(
		report.warnings,
		vec!["ProfileInterpreter disabled due to client emulation mode".to_string()]
	);
}

#[test]
fn runs_are_deterministic() {
	let build = || {
		let mut registry = Registry::new(HostSetup::default().with_processors(8));
		user(&mut registry, CompileThresholdScaling, 0.25);
		user(&mut registry, TieredStopAtLevel, 3);
		registry
	};
	let (mut first, mut second) = (build(), build());
	let first_report = run(&mut first);
	let second_report = run(&mut second);

	assert_eq!(first_report, second_report);
	for index in 0..first.len() {
		let id = FlagId::new(index as u16);
		assert_eq!(first.raw(id), second.raw(id));
		assert_eq!(first.provenance(id), second.provenance(id));
	}
}

#[test]
fn every_phase_validates_after_ergonomics() {
	for backends in [Backends::LIGHT, Backends::LIGHT | Backends::HEAVY, Backends::all()] {
		let mut registry = host(backends);
		registry.validate_phase(Phase::AtParse).unwrap();
		run(&mut registry);
		registry.validate_phase(Phase::AfterErgo).unwrap();
		memory_init(&mut registry).unwrap();
		registry.validate_phase(Phase::AfterMemoryInit).unwrap();
	}
}

#[test]
fn memory_init_resolves_the_prefetch_distance() {
	let mut registry = host(Backends::LIGHT | Backends::HEAVY);
	memory_init(&mut registry).unwrap();
	assert_eq!(registry.value(AllocatePrefetchDistance), DEFAULT_PREFETCH_DISTANCE);

	let mut registry = host(Backends::LIGHT | Backends::HEAVY);
	user(&mut registry, AllocatePrefetchDistance, 64);
	memory_init(&mut registry).unwrap();
	assert_eq!(registry.value(AllocatePrefetchDistance), 64);
}
