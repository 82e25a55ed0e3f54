//! Built-in flag table.
//!
//! Every flag is declared once here; the typed key constants are the handles
//! used by ergonomics, constraints and callers.

mod constraints;

use std::sync::LazyLock;

use crate::compiler::{BuildFlavor, HostSetup};
use crate::core::{Backends, FlagValue};
use crate::flags::{Bounds, FlagLimit, FlagTable, HostDefault, Phase};

const K: u64 = 1024;
const M: u64 = K * K;
const G: u64 = M * K;

/// Largest `int` value, the usual upper bound for counts and thresholds.
pub const MAX_JINT: isize = i32::MAX as isize;

/// Upper limit of the reserved code cache.
pub const CODE_CACHE_SIZE_LIMIT: u64 = 2 * G;

/// Reserved code cache cap applied when tiered compilation enlarges it.
pub const TIERED_CODE_CACHE_CAP: u64 = 240 * M;

crate::flags! {
	UnlockDiagnosticVMOptions, {
		type: Bool,
		default: false,
		kind: DIAGNOSTIC,
		doc: "Enable normal processing of flags relating to field diagnostics",
	};
	UnlockExperimentalVMOptions, {
		type: Bool,
		default: false,
		kind: EXPERIMENTAL,
		doc: "Enable normal processing of flags relating to experimental features",
	};
	IgnoreUnrecognizedVMOptions, {
		type: Bool,
		default: false,
		kind: PRODUCT,
		doc: "Ignore unrecognized VM options",
	};
	PrintFlagsFinal, {
		type: Bool,
		default: false,
		kind: PRODUCT,
		doc: "Print all VM flags after argument and ergonomic processing",
	};
	PrintFlagsInitial, {
		type: Bool,
		default: false,
		kind: PRODUCT,
		doc: "Print all VM flags before argument processing and exit VM",
	};
	PrintFlagsRanges, {
		type: Bool,
		default: false,
		kind: PRODUCT,
		doc: "Print VM flags and their ranges",
	};
	PrintFlagsWithComments, {
		type: Bool,
		default: false,
		kind: NOT_PRODUCT,
		doc: "Print all VM flags with default values and descriptions and exit",
	};
	PrintVMOptions, {
		type: Bool,
		default: false,
		kind: PRODUCT,
		doc: "Print flags that appeared on the command line",
	};
	CountCompiledCalls, {
		type: Bool,
		default: false,
		kind: DEVELOP,
		doc: "Count method invocations",
	};
	UseInterpreter, {
		type: Bool,
		default: true,
		kind: PRODUCT,
		doc: "Use interpreter for non-compiled methods",
	};
	UseCompiler, {
		type: Bool,
		default: true,
		kind: PRODUCT,
		doc: "Use Just-In-Time compilation",
	};
	UseLoopCounter, {
		type: Bool,
		default: true,
		kind: PRODUCT,
		doc: "Increment invocation counter on backward branch",
	};
	UseOnStackReplacement, {
		type: Bool,
		default: true,
		kind: PRODUCT | PLATFORM_DEPENDENT,
		doc: "Use on stack replacement, calls runtime if invoc. counter overflows in loop",
	};
	BackgroundCompilation, {
		type: Bool,
		default: true,
		kind: PRODUCT | PLATFORM_DEPENDENT,
		doc: "A thread requesting compilation is not blocked during compilation",
	};
	ProfileInterpreter, {
		type: Bool,
		default: true,
		kind: PRODUCT | PLATFORM_DEPENDENT,
		doc: "Profile at the bytecode level during interpretation",
	};
	TieredCompilation, {
		type: Bool,
		default: true,
		kind: PRODUCT,
		doc: "Enable tiered compilation",
	};
	NeverActAsServerClassMachine, {
		type: Bool,
		default: false,
		kind: PRODUCT | PLATFORM_DEPENDENT,
		doc: "Never act like a server-class machine",
	};
	CompilationMode, {
		type: Ccstr,
		default: Some("default"),
		kind: PRODUCT,
		doc: "Compilation modes: default: normal tiered compilation; quick-only: light backend only; high-only: heavy backends only; high-only-quick-internal: heavy backends only, with the alternate compiler itself compiled by the light backend",
	};
	EnableJVMCI, {
		type: Bool,
		default: false,
		kind: EXPERIMENTAL | HEAVY_ALT,
		doc: "Enable the alternate compiler interface",
	};
	UseJVMCICompiler, {
		type: Bool,
		default: false,
		kind: EXPERIMENTAL | HEAVY_ALT,
		doc: "Use the alternate compiler as the default heavy compiler",
	};
	ReplayCompiles, {
		type: Bool,
		default: false,
		kind: DIAGNOSTIC,
		doc: "Enable replay of compilations from ReplayDataFile",
	};
	ReplayDataFile, {
		type: Ccstr,
		default: None,
		kind: DIAGNOSTIC,
		doc: "File containing compilation replay information [default: ./replay_pid%p.log]",
	};
	CompileCommand, {
		type: CcstrList,
		default: None,
		kind: PRODUCT,
		doc: "Prepend to the compile command file; e.g. log,java/lang/String.<init>",
	};
	CompileThresholdScaling, {
		type: Double,
		default: 1.0,
		kind: PRODUCT,
		doc: "Factor to control when first compilation happens: values greater than 1.0 delay counter overflow, values between 0 and 1.0 rush counter overflow, 1.0 leaves thresholds unchanged and 0.0 is equivalent to -Xint",
	};
	CompileThreshold, {
		type: Intx,
		default: 10000,
		kind: PRODUCT | PLATFORM_DEPENDENT,
		doc: "number of interpreted method invocations before (re-)compiling",
	};
	OnStackReplacePercentage, {
		type: Intx,
		default: 140,
		kind: PRODUCT | PLATFORM_DEPENDENT,
		doc: "NON_TIERED number of method invocations/branches (expressed as % of CompileThreshold) before (re-)compiling OSR code",
	};
	InterpreterProfilePercentage, {
		type: Intx,
		default: 33,
		kind: PRODUCT,
		doc: "NON_TIERED number of method invocations/branches (expressed as % of CompileThreshold) before profiling in the interpreter",
	};
	TieredStopAtLevel, {
		type: Intx,
		default: 4,
		kind: PRODUCT,
		doc: "Stop at given compilation level",
	};
	Tier0InvokeNotifyFreqLog, {
		type: Intx,
		default: 7,
		kind: PRODUCT,
		doc: "Interpreter (tier 0) invocation notification frequency",
	};
	Tier0BackedgeNotifyFreqLog, {
		type: Intx,
		default: 10,
		kind: PRODUCT,
		doc: "Interpreter (tier 0) backedge notification frequency",
	};
	Tier2InvokeNotifyFreqLog, {
		type: Intx,
		default: 11,
		kind: PRODUCT,
		doc: "Light backend without profiling (tier 2) invocation notification frequency",
	};
	Tier2BackedgeNotifyFreqLog, {
		type: Intx,
		default: 14,
		kind: PRODUCT,
		doc: "Light backend without profiling (tier 2) backedge notification frequency",
	};
	Tier3InvokeNotifyFreqLog, {
		type: Intx,
		default: 10,
		kind: PRODUCT,
		doc: "Light backend with profiling (tier 3) invocation notification frequency",
	};
	Tier3BackedgeNotifyFreqLog, {
		type: Intx,
		default: 13,
		kind: PRODUCT,
		doc: "Light backend with profiling (tier 3) backedge notification frequency",
	};
	Tier23InlineeNotifyFreqLog, {
		type: Intx,
		default: 20,
		kind: PRODUCT,
		doc: "Inlinee invocation (tiers 2 and 3) notification frequency",
	};
	Tier0ProfilingStartPercentage, {
		type: Intx,
		default: 200,
		kind: PRODUCT,
		doc: "Start profiling in interpreter if the counters exceed the specified percentage of tier 3 thresholds (tier 4 thresholds with CompilationMode=high-only|high-only-quick-internal)",
	};
	Tier3InvocationThreshold, {
		type: Intx,
		default: 200,
		kind: PRODUCT,
		doc: "Compile if number of method invocations crosses this threshold",
	};
	Tier3MinInvocationThreshold, {
		type: Intx,
		default: 100,
		kind: PRODUCT,
		doc: "Minimum invocation to compile at tier 3",
	};
	Tier3CompileThreshold, {
		type: Intx,
		default: 2000,
		kind: PRODUCT,
		doc: "Threshold at which tier 3 compilation is invoked (invocation minimum must be satisfied)",
	};
	Tier3BackEdgeThreshold, {
		type: Intx,
		default: 60000,
		kind: PRODUCT,
		doc: "Back edge threshold at which tier 3 OSR compilation is invoked",
	};
	Tier4InvocationThreshold, {
		type: Intx,
		default: 5000,
		kind: PRODUCT,
		doc: "Compile if number of method invocations crosses this threshold",
	};
	Tier4MinInvocationThreshold, {
		type: Intx,
		default: 600,
		kind: PRODUCT,
		doc: "Minimum invocation to compile at tier 4",
	};
	Tier4CompileThreshold, {
		type: Intx,
		default: 15000,
		kind: PRODUCT,
		doc: "Threshold at which tier 4 compilation is invoked (invocation minimum must be satisfied)",
	};
	Tier4BackEdgeThreshold, {
		type: Intx,
		default: 40000,
		kind: PRODUCT,
		doc: "Back edge threshold at which tier 4 OSR compilation is invoked",
	};
	CICompilerCount, {
		type: Intx,
		default: 12,
		kind: PRODUCT,
		doc: "Number of compiler threads to run",
	};
	CICompilerCountPerCPU, {
		type: Bool,
		default: true,
		kind: PRODUCT,
		doc: "1 compiler thread for log(N CPUs)",
	};
	ReservedCodeCacheSize, {
		type: SizeT,
		default: 48 * M,
		kind: PRODUCT | PLATFORM_DEPENDENT,
		doc: "Reserved code cache size (in bytes) - maximum code cache size",
	};
	InitialCodeCacheSize, {
		type: SizeT,
		default: 2496 * K,
		kind: PRODUCT | PLATFORM_DEPENDENT,
		doc: "Initial code cache size (in bytes)",
	};
	NonNMethodCodeHeapSize, {
		type: SizeT,
		default: 5 * M,
		kind: PRODUCT,
		doc: "Size of code heap with non-nmethods (in bytes)",
	};
	ProfiledCodeHeapSize, {
		type: SizeT,
		default: 21 * M,
		kind: PRODUCT,
		doc: "Size of code heap with profiled methods (in bytes)",
	};
	NonProfiledCodeHeapSize, {
		type: SizeT,
		default: 21 * M,
		kind: PRODUCT,
		doc: "Size of code heap with non-profiled methods (in bytes)",
	};
	CodeCacheExpansionSize, {
		type: SizeT,
		default: 64 * K,
		kind: PRODUCT,
		doc: "Code cache expansion size (in bytes)",
	};
	SegmentedCodeCache, {
		type: Bool,
		default: false,
		kind: PRODUCT,
		doc: "Use a segmented code cache",
	};
	MaxRAM, {
		type: Uint64,
		default: 128 * G,
		kind: PRODUCT | PLATFORM_DEPENDENT,
		doc: "Real memory size (in bytes) used to set maximum heap size",
	};
	C1InlineStackLimit, {
		type: Intx,
		default: 10,
		kind: PRODUCT | LIGHT,
		doc: "inlining only allowed for methods which don't exceed this number of stack frames",
	};
	InlineSmallCode, {
		type: Intx,
		default: 1000,
		kind: PRODUCT | HEAVY,
		doc: "Only inline already compiled methods if their code size is less than this",
	};
	Inline, {
		type: Bool,
		default: true,
		kind: PRODUCT,
		doc: "Enable inlining",
	};
	IncrementalInline, {
		type: Bool,
		default: true,
		kind: PRODUCT | HEAVY,
		doc: "do post parse inlining",
	};
	IncrementalInlineMH, {
		type: Bool,
		default: true,
		kind: DIAGNOSTIC | HEAVY,
		doc: "do post parse inlining of method handle calls",
	};
	IncrementalInlineVirtual, {
		type: Bool,
		default: true,
		kind: DIAGNOSTIC | HEAVY,
		doc: "do post parse inlining of virtual calls",
	};
	EliminateLocks, {
		type: Bool,
		default: true,
		kind: PRODUCT | HEAVY,
		doc: "Coarsen locks when possible",
	};
	EliminateNestedLocks, {
		type: Bool,
		default: true,
		kind: PRODUCT | HEAVY,
		doc: "Eliminate nested locks of the same object when possible",
	};
	UseTypeSpeculation, {
		type: Bool,
		default: true,
		kind: PRODUCT | HEAVY,
		doc: "Speculatively propagate types from profiles",
	};
	TypeProfileLevel, {
		type: Uintx,
		default: 111,
		kind: PRODUCT | PLATFORM_DEPENDENT,
		doc: "=XYT, T=1 arguments, T=2 arguments and return value; Y=1 return value; X=1 parameters",
	};
	OptoLoopAlignment, {
		type: Intx,
		default: 16,
		kind: PRODUCT | PLATFORM_DEPENDENT,
		doc: "Align inner loops to zero relative to this modulus",
	};
	MaxLoopPad, {
		type: Intx,
		default: 15,
		kind: PRODUCT | HEAVY,
		doc: "Align a loop if padding size in bytes is less or equal to this value",
	};
	LoopStripMiningIter, {
		type: Uintx,
		default: 1000,
		kind: PRODUCT | HEAVY,
		doc: "Number of iterations in strip mined loop",
	};
	LoopStripMiningIterShortLoop, {
		type: Uintx,
		default: 0,
		kind: PRODUCT | HEAVY,
		doc: "Loop with fewer iterations are not strip mined",
	};
	UseCountedLoopSafepoints, {
		type: Bool,
		default: true,
		kind: PRODUCT | HEAVY,
		doc: "Force counted loops to keep a safepoint",
	};
	PostLoopMultiversioning, {
		type: Bool,
		default: false,
		kind: EXPERIMENTAL | HEAVY,
		doc: "Multi versioned post loops to eliminate range checks",
	};
	RangeCheckElimination, {
		type: Bool,
		default: true,
		kind: PRODUCT,
		doc: "Eliminate range checks",
	};
	TraceLoopOpts, {
		type: Bool,
		default: false,
		kind: DEVELOP | HEAVY,
		doc: "Trace executed loop optimizations",
	};
	VerifyLoopOptimizations, {
		type: Bool,
		default: false,
		kind: NOT_PRODUCT | HEAVY,
		doc: "verify major loop optimizations",
	};
	AllocatePrefetchDistance, {
		type: Intx,
		default: -1,
		kind: PRODUCT,
		doc: "Distance to prefetch ahead of allocation pointer. -1: use system-specific value (automatically determined)",
	};
	UseCompressedOops, {
		type: Bool,
		default: false,
		kind: PRODUCT | LP64,
		doc: "Use 32-bit object references in 64-bit VM",
	};
	PrintConcurrentLocks, {
		type: Bool,
		default: false,
		kind: MANAGEABLE,
		doc: "Print java.util.concurrent locks in thread dump",
	};
	HeapDumpPath, {
		type: Ccstr,
		default: None,
		kind: MANAGEABLE,
		doc: "When HeapDumpOnOutOfMemoryError is on, the path (filename or directory) of the dump file (defaults to java_pid<pid>.hprof in the working directory)",
	};
	MinHeapFreeRatio, {
		type: Uintx,
		default: 40,
		kind: MANAGEABLE,
		doc: "The minimum percentage of heap free after GC to avoid expansion",
	};
	MaxHeapFreeRatio, {
		type: Uintx,
		default: 70,
		kind: MANAGEABLE,
		doc: "The maximum percentage of heap free after GC to avoid shrinking",
	};
	FilterSpuriousWakeups, {
		type: Bool,
		default: true,
		kind: PRODUCT,
		doc: "When true prevents OS-level spurious, or premature, wakeups from Object.wait",
	};
	CreateCoredumpOnCrash, {
		type: Bool,
		default: true,
		kind: PRODUCT,
		doc: "Create core/mini dump on VM fatal error",
	};
}

/// Ranges and constraints, sparse over [`FLAGS`].
pub static LIMITS: &[FlagLimit] = &[
	FlagLimit::new(CompilationMode.id()).constraint(constraints::compilation_mode, Phase::AtParse),
	FlagLimit::new(CompileThreshold.id())
		.range(Bounds::Intx(0, MAX_JINT))
		.constraint(constraints::compile_threshold, Phase::AfterErgo),
	FlagLimit::new(OnStackReplacePercentage.id())
		.range(Bounds::Intx(0, isize::MAX))
		.constraint(constraints::on_stack_replace_percentage, Phase::AfterErgo),
	FlagLimit::new(InterpreterProfilePercentage.id()).range(Bounds::Intx(0, 100)),
	FlagLimit::new(TieredStopAtLevel.id()).range(Bounds::Intx(0, 4)),
	FlagLimit::new(Tier0InvokeNotifyFreqLog.id()).range(Bounds::Intx(0, 30)),
	FlagLimit::new(Tier0BackedgeNotifyFreqLog.id()).range(Bounds::Intx(0, 30)),
	FlagLimit::new(Tier2InvokeNotifyFreqLog.id()).range(Bounds::Intx(0, 30)),
	FlagLimit::new(Tier2BackedgeNotifyFreqLog.id()).range(Bounds::Intx(0, 30)),
	FlagLimit::new(Tier3InvokeNotifyFreqLog.id()).range(Bounds::Intx(0, 30)),
	FlagLimit::new(Tier3BackedgeNotifyFreqLog.id()).range(Bounds::Intx(0, 30)),
	FlagLimit::new(Tier23InlineeNotifyFreqLog.id()).range(Bounds::Intx(0, 30)),
	FlagLimit::new(Tier0ProfilingStartPercentage.id()).range(Bounds::Intx(0, MAX_JINT)),
	FlagLimit::new(Tier3InvocationThreshold.id()).range(Bounds::Intx(0, MAX_JINT)),
	FlagLimit::new(Tier3MinInvocationThreshold.id()).range(Bounds::Intx(0, MAX_JINT)),
	FlagLimit::new(Tier3CompileThreshold.id()).range(Bounds::Intx(0, MAX_JINT)),
	FlagLimit::new(Tier3BackEdgeThreshold.id()).range(Bounds::Intx(0, MAX_JINT)),
	FlagLimit::new(Tier4InvocationThreshold.id()).range(Bounds::Intx(0, MAX_JINT)),
	FlagLimit::new(Tier4MinInvocationThreshold.id()).range(Bounds::Intx(0, MAX_JINT)),
	FlagLimit::new(Tier4CompileThreshold.id()).range(Bounds::Intx(0, MAX_JINT)),
	FlagLimit::new(Tier4BackEdgeThreshold.id()).range(Bounds::Intx(0, MAX_JINT)),
	FlagLimit::new(CICompilerCount.id())
		.range(Bounds::Intx(0, MAX_JINT))
		.constraint(constraints::ci_compiler_count, Phase::AfterErgo),
	FlagLimit::new(ReservedCodeCacheSize.id())
		.range(Bounds::SizeT(0, CODE_CACHE_SIZE_LIMIT))
		.constraint(constraints::reserved_code_cache_size, Phase::AfterErgo),
	FlagLimit::new(C1InlineStackLimit.id()).range(Bounds::Intx(0, MAX_JINT)),
	FlagLimit::new(InlineSmallCode.id()).range(Bounds::Intx(0, MAX_JINT)),
	FlagLimit::new(TypeProfileLevel.id()).constraint(constraints::type_profile_level, Phase::AfterErgo),
	FlagLimit::new(OptoLoopAlignment.id())
		.range(Bounds::Intx(1, 16))
		.constraint(constraints::opto_loop_alignment, Phase::AfterErgo),
	FlagLimit::new(MaxLoopPad.id()).range(Bounds::Intx(0, MAX_JINT)),
	FlagLimit::new(LoopStripMiningIter.id())
		.constraint(constraints::loop_strip_mining_iter, Phase::AfterErgo),
	FlagLimit::new(AllocatePrefetchDistance.id())
		.range(Bounds::Intx(-1, 512))
		.constraint(constraints::allocate_prefetch_distance, Phase::AfterMemoryInit),
	FlagLimit::new(MinHeapFreeRatio.id())
		.range(Bounds::Uintx(0, 100))
		.constraint(constraints::min_heap_free_ratio, Phase::AfterErgo),
	FlagLimit::new(MaxHeapFreeRatio.id())
		.range(Bounds::Uintx(0, 100))
		.constraint(constraints::max_heap_free_ratio, Phase::AfterErgo),
];

fn light_only(host: &HostSetup) -> bool {
	!host.backends.intersects(Backends::HEAVY | Backends::HEAVY_ALT)
}

/// Defaults that depend on the host backends and build flavor.
pub static HOST_DEFAULTS: &[HostDefault] = &[
	HostDefault {
		flag: UnlockDiagnosticVMOptions.id(),
		value: |host| FlagValue::Bool(host.flavor == BuildFlavor::Debug),
	},
	HostDefault {
		flag: UseOnStackReplacement.id(),
		value: |_| FlagValue::Bool(true),
	},
	HostDefault {
		flag: BackgroundCompilation.id(),
		value: |_| FlagValue::Bool(true),
	},
	HostDefault {
		flag: ProfileInterpreter.id(),
		value: |host| FlagValue::Bool(!light_only(host)),
	},
	HostDefault {
		flag: TieredCompilation.id(),
		value: |host| FlagValue::Bool(!light_only(host)),
	},
	HostDefault {
		flag: NeverActAsServerClassMachine.id(),
		value: |host| FlagValue::Bool(light_only(host)),
	},
	HostDefault {
		flag: CompileThreshold.id(),
		value: |host| FlagValue::Intx(if light_only(host) { 1500 } else { 10000 }),
	},
	HostDefault {
		flag: OnStackReplacePercentage.id(),
		value: |host| FlagValue::Intx(if light_only(host) { 933 } else { 140 }),
	},
	HostDefault {
		flag: ReservedCodeCacheSize.id(),
		value: |host| {
			FlagValue::SizeT(bytesize::ByteSize(if light_only(host) { 32 * M } else { 48 * M }))
		},
	},
	HostDefault {
		flag: InitialCodeCacheSize.id(),
		value: |host| FlagValue::SizeT(bytesize::ByteSize(if light_only(host) { 160 * K } else { 2496 * K })),
	},
	HostDefault {
		flag: MaxRAM.id(),
		value: |host| FlagValue::Uint64(if light_only(host) { G } else { 128 * G }),
	},
	HostDefault {
		flag: TypeProfileLevel.id(),
		value: |_| FlagValue::Uintx(111),
	},
	HostDefault {
		flag: OptoLoopAlignment.id(),
		value: |_| FlagValue::Intx(16),
	},
];

static TABLE: LazyLock<FlagTable> = LazyLock::new(|| FlagTable::new(FLAGS, LIMITS, HOST_DEFAULTS));

/// The process-wide built-in table, built on first use.
pub fn table() -> &'static FlagTable {
	&TABLE
}
