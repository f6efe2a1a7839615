use env_param::EnvParam;

static ADD_COST: EnvParam<Cost> = EnvParam::new("MULSEQ_ADD_COST", "1");
static SUB_COST: EnvParam<Cost> = EnvParam::new("MULSEQ_SUB_COST", "1");
static SHIFT_COST: EnvParam<Cost> = EnvParam::new("MULSEQ_SHIFT_COST", "1");
static MAKEZERO_COST: EnvParam<Cost> = EnvParam::new("MULSEQ_MAKEZERO_COST", "1");
static BYONE_COST: EnvParam<Cost> = EnvParam::new("MULSEQ_BYONE_COST", "0");

/// Weight of a straight-line program, summed from per-operation constants.
pub type Cost = u32;

/// Larger than the cost of any program we expect to see. Assigning it to an
/// operation makes that operation unavailable.
pub const INFINITE_COST: Cost = Cost::MAX / 2;

/// The per-operation cost constants of a search.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CostModel {
    pub add: Cost,
    pub sub: Cost,
    pub shift: Cost,
    /// Cost of a multiplication by 0.
    pub makezero: Cost,
    /// Cost of a multiplication by 1.
    pub byone: Cost,
}

impl CostModel {
    pub const fn new(add: Cost, sub: Cost, shift: Cost) -> CostModel {
        CostModel {
            add,
            sub,
            shift,
            makezero: 1,
            byone: 0,
        }
    }

    /// Makes subtraction unavailable.
    pub const fn without_sub(mut self) -> CostModel {
        self.sub = INFINITE_COST;
        self
    }

    pub const fn sub_enabled(&self) -> bool {
        self.sub < INFINITE_COST
    }
}

/// The defaults come from the `MULSEQ_*_COST` environment variables.
impl Default for CostModel {
    fn default() -> Self {
        CostModel {
            add: ADD_COST.get(),
            sub: SUB_COST.get(),
            shift: SHIFT_COST.get(),
            makezero: MAKEZERO_COST.get(),
            byone: BYONE_COST.get(),
        }
    }
}
