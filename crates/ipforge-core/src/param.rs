//! Parameter declarations and the parameter table.
//!
//! Defaults may reference other parameters declared anywhere in the list, or
//! external macros supplied by the caller. Resolution builds the reference
//! graph first, rejects undefined names and cycles, and only then evaluates
//! in topological order.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{DescriptorError, DescriptorWarning, Result};
use crate::expr::{EvalError, Expr, RawExpr};

/// Kind of a configuration entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    /// A `define`-style macro. Never bounded.
    #[serde(alias = "M")]
    Macro,
    /// A numeric module parameter.
    #[default]
    #[serde(alias = "P")]
    Parameter,
}

/// One side of a parameter's range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawExpr", into = "RawExpr")]
pub enum Bound {
    /// Written `NA`.
    Unbounded,
    Expr(Expr),
}

impl Bound {
    fn references(&self) -> Vec<&str> {
        match self {
            Bound::Unbounded => Vec::new(),
            Bound::Expr(e) => e.references(),
        }
    }
}

impl TryFrom<RawExpr> for Bound {
    type Error = crate::expr::ParseError;

    fn try_from(raw: RawExpr) -> std::result::Result<Self, Self::Error> {
        match raw {
            RawExpr::Text(s) if s.trim() == "NA" => Ok(Bound::Unbounded),
            other => Ok(Bound::Expr(Expr::try_from(other)?)),
        }
    }
}

impl From<Bound> for RawExpr {
    fn from(bound: Bound) -> Self {
        match bound {
            Bound::Unbounded => RawExpr::Text("NA".to_string()),
            Bound::Expr(e) => e.into(),
        }
    }
}

fn unbounded() -> Bound {
    Bound::Unbounded
}

/// A configuration parameter or macro declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(default)]
    pub kind: ParamKind,
    pub default: Expr,
    #[serde(default = "unbounded")]
    pub min: Bound,
    #[serde(default = "unbounded")]
    pub max: Bound,
    #[serde(default)]
    pub description: String,
    /// Expression the default is expected to match, if documented.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<Expr>,
}

impl Parameter {
    /// A numeric parameter with no bounds.
    pub fn numeric(name: &str, default: Expr) -> Self {
        Parameter {
            name: name.to_string(),
            kind: ParamKind::Parameter,
            default,
            min: Bound::Unbounded,
            max: Bound::Unbounded,
            description: String::new(),
            hint: None,
        }
    }

    /// A macro.
    pub fn macro_def(name: &str, default: Expr) -> Self {
        Parameter {
            kind: ParamKind::Macro,
            ..Parameter::numeric(name, default)
        }
    }

    pub fn with_bounds(mut self, min: Bound, max: Bound) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_hint(mut self, hint: Expr) -> Self {
        self.hint = Some(hint);
        self
    }

    /// Names this declaration depends on (default and bounds).
    pub fn dependencies(&self) -> Vec<&str> {
        let mut deps = self.default.references();
        if self.kind == ParamKind::Parameter {
            for name in self.min.references().into_iter().chain(self.max.references()) {
                if !deps.contains(&name) {
                    deps.push(name);
                }
            }
        }
        deps
    }
}

/// One resolved entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedParameter {
    pub name: String,
    pub kind: ParamKind,
    pub value: i64,
}

/// Resolved parameter values in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<ResolvedParameter>", into = "Vec<ResolvedParameter>")]
pub struct ResolvedParameters {
    entries: Vec<ResolvedParameter>,
    index: BTreeMap<String, usize>,
}

impl From<Vec<ResolvedParameter>> for ResolvedParameters {
    fn from(entries: Vec<ResolvedParameter>) -> Self {
        ResolvedParameters::from_entries(entries)
    }
}

impl From<ResolvedParameters> for Vec<ResolvedParameter> {
    fn from(resolved: ResolvedParameters) -> Self {
        resolved.entries
    }
}

impl ResolvedParameters {
    fn from_entries(entries: Vec<ResolvedParameter>) -> Self {
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.name.clone(), i))
            .collect();
        ResolvedParameters { entries, index }
    }

    /// Value of a resolved parameter.
    pub fn get(&self, name: &str) -> Option<i64> {
        self.index.get(name).map(|&i| self.entries[i].value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &ResolvedParameter> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// External names visible to parameter expressions (e.g. derived macros).
pub type Externals = BTreeMap<String, i64>;

/// An ordered table of parameter declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterTable {
    params: Vec<Parameter>,
    index: HashMap<String, usize>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

impl ParameterTable {
    /// Build a table, rejecting duplicate names.
    pub fn new(params: Vec<Parameter>) -> Result<Self> {
        let mut index = HashMap::new();
        for (i, p) in params.iter().enumerate() {
            if let Some(&first) = index.get(&p.name) {
                return Err(DescriptorError::DuplicateParameter {
                    name: p.name.clone(),
                    first,
                    second: i,
                });
            }
            index.insert(p.name.clone(), i);
        }
        Ok(ParameterTable { params, index })
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.index.get(name).map(|&i| &self.params[i])
    }

    /// Declarations in order.
    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Resolve every declared parameter.
    pub fn resolve(&self, externals: &Externals) -> Result<ResolvedParameters> {
        let roots: Vec<usize> = (0..self.params.len()).collect();
        self.resolve_roots(&roots, externals)
    }

    /// Resolve only `names` and what they transitively depend on.
    ///
    /// A name that is neither declared nor external fails with
    /// `UndefinedParameterReference`.
    pub fn resolve_subset(&self, names: &[&str], externals: &Externals) -> Result<ResolvedParameters> {
        let mut roots = Vec::new();
        for name in names {
            match self.index.get(*name) {
                Some(&i) => roots.push(i),
                None if externals.contains_key(*name) => {}
                None => {
                    return Err(DescriptorError::UndefinedParameterReference {
                        reference: name.to_string(),
                        context: "parameter subset request".to_string(),
                    })
                }
            }
        }
        self.resolve_roots(&roots, externals)
    }

    fn resolve_roots(&self, roots: &[usize], externals: &Externals) -> Result<ResolvedParameters> {
        let order = self.evaluation_order(roots, externals)?;
        log::debug!(
            "evaluating {} of {} parameters",
            order.len(),
            self.params.len()
        );

        let mut values: HashMap<&str, i64> = HashMap::new();
        for &i in &order {
            let p = &self.params[i];
            let lookup = |name: &str| values.get(name).copied().or_else(|| externals.get(name).copied());
            let value = p
                .default
                .eval(&lookup)
                .map_err(|e| eval_error(e, &format!("default of parameter '{}'", p.name)))?;
            if p.kind == ParamKind::Parameter {
                let min = eval_bound(&p.min, &lookup, &p.name, "min")?;
                let max = eval_bound(&p.max, &lookup, &p.name, "max")?;
                let below = min.is_some_and(|m| value < m);
                let above = max.is_some_and(|m| value > m);
                if below || above {
                    return Err(DescriptorError::OutOfBounds {
                        name: p.name.clone(),
                        value,
                        min,
                        max,
                    });
                }
            }
            values.insert(p.name.as_str(), value);
        }

        let mut selected = order;
        selected.sort_unstable();
        let entries = selected
            .into_iter()
            .map(|i| {
                let p = &self.params[i];
                ResolvedParameter {
                    name: p.name.clone(),
                    kind: p.kind,
                    value: values[p.name.as_str()],
                }
            })
            .collect();
        Ok(ResolvedParameters::from_entries(entries))
    }

    /// Depth-first topological order over the closure of `roots`.
    ///
    /// Runs to completion before any expression is evaluated, so undefined
    /// names and cycles are reported without partial results.
    fn evaluation_order(&self, roots: &[usize], externals: &Externals) -> Result<Vec<usize>> {
        let mut marks = vec![Mark::Unvisited; self.params.len()];
        let mut order = Vec::with_capacity(self.params.len());
        let mut path = Vec::new();

        for &root in roots {
            self.visit(root, externals, &mut marks, &mut path, &mut order)?;
        }
        Ok(order)
    }

    fn visit(
        &self,
        node: usize,
        externals: &Externals,
        marks: &mut [Mark],
        path: &mut Vec<usize>,
        order: &mut Vec<usize>,
    ) -> Result<()> {
        match marks[node] {
            Mark::Done => return Ok(()),
            Mark::InProgress => {
                let start = path.iter().position(|&n| n == node).unwrap_or(0);
                let mut cycle: Vec<String> =
                    path[start..].iter().map(|&n| self.params[n].name.clone()).collect();
                cycle.push(self.params[node].name.clone());
                return Err(DescriptorError::CyclicParameterReference { cycle });
            }
            Mark::Unvisited => {}
        }

        marks[node] = Mark::InProgress;
        path.push(node);

        let param = &self.params[node];
        for dep in param.dependencies() {
            match self.index.get(dep) {
                Some(&next) => self.visit(next, externals, marks, path, order)?,
                None if externals.contains_key(dep) => {}
                None => {
                    return Err(DescriptorError::UndefinedParameterReference {
                        reference: dep.to_string(),
                        context: format!("parameter '{}' (#{node})", param.name),
                    })
                }
            }
        }

        path.pop();
        marks[node] = Mark::Done;
        order.push(node);
        Ok(())
    }

    /// Compare each documented hint with the resolved value.
    ///
    /// The declared value is kept; a mismatch is only reported.
    pub fn check_hints(&self, resolved: &ResolvedParameters, externals: &Externals) -> Vec<DescriptorWarning> {
        let lookup = |name: &str| resolved.get(name).or_else(|| externals.get(name).copied());
        let mut warnings = Vec::new();
        for p in &self.params {
            let (Some(hint), Some(actual)) = (&p.hint, resolved.get(&p.name)) else {
                continue;
            };
            let message = match hint.eval(&lookup) {
                Ok(expected) if expected == actual => continue,
                Ok(expected) => format!(
                    "declared default '{}' = {actual} differs from documented '{hint}' = {expected}",
                    p.default
                ),
                Err(e) => format!("documented '{hint}' cannot be evaluated: {e}"),
            };
            warnings.push(DescriptorWarning {
                subject: format!("parameter {}", p.name),
                message,
            });
        }
        warnings
    }
}

fn eval_bound<F>(bound: &Bound, lookup: &F, name: &str, side: &str) -> Result<Option<i64>>
where
    F: Fn(&str) -> Option<i64>,
{
    match bound {
        Bound::Unbounded => Ok(None),
        Bound::Expr(e) => e
            .eval(lookup)
            .map(Some)
            .map_err(|err| eval_error(err, &format!("{side} bound of parameter '{name}'"))),
    }
}

/// Map an evaluation failure into the descriptor taxonomy.
pub fn eval_error(err: EvalError, context: &str) -> DescriptorError {
    match err {
        EvalError::Undefined(reference) => DescriptorError::UndefinedParameterReference {
            reference,
            context: context.to_string(),
        },
        other => DescriptorError::InvalidExpression {
            context: context.to_string(),
            detail: other.to_string(),
        },
    }
}
