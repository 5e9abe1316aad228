use std::{cell::RefCell, rc::Rc};

use fnv::FnvHashMap;
use itertools::Itertools;
use rand::{rngs::StdRng, seq::SliceRandom, RngCore, SeedableRng};

use crate::{
    errors::{SynthError, SynthResult},
    ty::{Ty, TyCaps, TypeHierarchy},
};

mod operation;
mod order;

pub use operation::{Criteria, Introspect, Invoke, Module, Operation, Receiver};
pub use order::{Candidate, CandidateOrder, RegistrationOrder, WeightedShuffle};

struct Entry {
    op: Rc<Operation>,
    weight: f64,
}

pub(crate) fn check_weight(weight: f64, what: &dyn std::fmt::Display) -> SynthResult {
    if weight < 0.0 || weight.is_nan() {
        return Err(SynthError::config(format!(
            "weight of `{}` cannot be negative (got {})",
            what, weight
        )));
    }
    Ok(())
}

/// Type-indexed store of stateless operations.
///
/// Every operation is indexed under its return type and all of that type's
/// ancestors, so asking for a supertype or interface also finds operations
/// returning a descendant. Declaring a supertype later re-indexes the
/// operations registered so far.
pub struct Registry {
    types: TypeHierarchy,
    hosts: Vec<Ty>,
    entries: Vec<Entry>,
    keys: FnvHashMap<String, usize>,
    index: FnvHashMap<Ty, Vec<usize>>,
    order: Box<dyn CandidateOrder>,
    rng: RefCell<Box<dyn RngCore>>,
}

impl Registry {
    pub fn new<R: RngCore + 'static>(rng: R) -> Registry {
        Registry {
            types: TypeHierarchy::with_builtins(),
            hosts: vec![],
            entries: vec![],
            keys: FnvHashMap::default(),
            index: FnvHashMap::default(),
            order: Box::new(WeightedShuffle),
            rng: RefCell::new(Box::new(rng)),
        }
    }

    pub fn seeded(seed: u64) -> Registry {
        Registry::new(StdRng::seed_from_u64(seed))
    }

    pub fn with_order<O: CandidateOrder + 'static>(mut self, order: O) -> Registry {
        self.order = Box::new(order);
        self
    }

    pub fn types(&self) -> &TypeHierarchy {
        &self.types
    }

    /// Declares supertypes and interfaces of `ty` outside of `register_type`.
    pub fn declare_type(&mut self, ty: &Ty, supertypes: &[Ty]) {
        if self.types.declare(ty, supertypes) {
            self.reindex();
        }
    }

    fn reindex(&mut self) {
        let mut index = FnvHashMap::<Ty, Vec<usize>>::default();
        for (idx, entry) in self.entries.iter().enumerate() {
            for ty in self.types.ancestors(entry.op.ret()) {
                index.entry(ty).or_default().push(idx);
            }
        }
        self.index = index;
    }

    /// Host types registered through `register_type`, in registration order.
    pub fn host_types(&self) -> &[Ty] {
        &self.hosts
    }

    pub fn register_type(&mut self, host: &dyn Introspect) -> SynthResult<usize> {
        self.register_type_with(host, &Criteria::default())
    }

    /// Registers the operations of `host` accepted by `criteria`, each with
    /// the criteria's weight. Returns how many were newly registered.
    pub fn register_type_with(
        &mut self,
        host: &dyn Introspect,
        criteria: &Criteria<Operation>,
    ) -> SynthResult<usize> {
        let ty = host.ty();
        check_weight(criteria.weight, &ty)?;

        self.declare_type(&ty, &host.supertypes());
        if !self.hosts.contains(&ty) {
            self.hosts.push(ty.clone());
        }

        let mut count = 0;
        for op in host.describe_operations() {
            if (criteria.matches)(&op) && self.register_operation_with_weight(op, criteria.weight)? {
                count += 1;
            }
        }

        log::debug!("registered {} operation(s) from `{}`", count, ty);
        Ok(count)
    }

    pub fn register_operation(&mut self, op: Operation) -> SynthResult<bool> {
        self.register_operation_with_weight(op, 1.0)
    }

    /// Registers a single operation. Operations that need an instance, and
    /// operations already registered, are skipped and yield `false`.
    pub fn register_operation_with_weight(
        &mut self,
        op: Operation,
        weight: f64,
    ) -> SynthResult<bool> {
        check_weight(weight, &op)?;

        if !op.is_static() {
            log::debug!("skipping `{}`: it needs an instance", op);
            return Ok(false);
        }

        let key = op.key();
        if self.keys.contains_key(&key) {
            return Ok(false);
        }

        let idx = self.entries.len();
        for ty in self.types.ancestors(op.ret()) {
            self.index.entry(ty).or_default().push(idx);
        }
        self.keys.insert(key, idx);
        self.entries.push(Entry {
            op: Rc::new(op),
            weight,
        });
        Ok(true)
    }

    pub fn register_module(&mut self, module: &Module) -> SynthResult<usize> {
        self.register_module_with(module, &Criteria::default())
    }

    /// Registers every host type of `module` accepted by `criteria`. The
    /// criteria's weight becomes the weight of each of their operations.
    pub fn register_module_with(
        &mut self,
        module: &Module,
        criteria: &Criteria<dyn Introspect>,
    ) -> SynthResult<usize> {
        let per_type = Criteria::default().with_weight(criteria.weight);
        let mut count = 0;
        for host in module.types.iter() {
            if (criteria.matches)(host.as_ref()) {
                count += self.register_type_with(host.as_ref(), &per_type)?;
            }
        }

        log::debug!("registered {} operation(s) from module `{}`", count, module.name);
        Ok(count)
    }

    pub fn has_type(&self, ty: &Ty) -> bool {
        self.index.contains_key(ty)
    }

    /// Every operation indexed under `ty`, in the order chosen by the
    /// registry's strategy. The order is drawn anew on every call.
    pub fn query_operations(&self, ty: &Ty) -> Vec<Rc<Operation>> {
        let indices = unless!(self.index.get(ty), else return vec![]);
        let candidates = indices
            .iter()
            .map(|idx| {
                let entry = &self.entries[*idx];
                Candidate {
                    op: Rc::clone(&entry.op),
                    weight: entry.weight,
                }
            })
            .collect::<Vec<_>>();

        let mut rng = self.rng.borrow_mut();
        self.order.order(candidates, &mut **rng)
    }

    /// Picks one of the concrete types produced by a registered operation
    /// with a positive weight, restricted to types offering one of `caps`.
    /// Empty `caps` accept every type.
    pub fn pick_type(&self, caps: TyCaps) -> Option<Ty> {
        let candidates = self
            .entries
            .iter()
            .filter(|e| e.weight > 0.0)
            .map(|e| e.op.ret())
            .unique()
            .filter(|ty| caps.is_empty() || ty.caps().intersects(caps))
            .cloned()
            .collect::<Vec<_>>();

        let mut rng = self.rng.borrow_mut();
        candidates.choose(&mut **rng).cloned()
    }

    /// Weight of the operations registered under `name`, if any.
    pub fn operation_weight(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.op.name() == name)
            .map(|e| e.weight)
    }

    /// Sets the weight of every operation registered under `name`.
    pub fn set_operation_weight(&mut self, name: &str, weight: f64) -> SynthResult {
        check_weight(weight, &name)?;

        let mut found = false;
        for entry in self.entries.iter_mut().filter(|e| e.op.name() == name) {
            entry.weight = weight;
            found = true;
        }

        if !found {
            return Err(SynthError::config(format!(
                "no operation named `{}` is registered",
                name
            )));
        }
        Ok(())
    }

    pub fn operations(&self) -> impl Iterator<Item = (&Operation, f64)> {
        self.entries.iter().map(|e| (e.op.as_ref(), e.weight))
    }

    pub fn is_assignable(&self, actual: &Ty, requested: &Ty) -> bool {
        self.types.is_assignable(actual, requested)
    }
}

#[cfg(test)]
mod registry_tests {
    use super::{Criteria, Introspect, Module, Operation, RegistrationOrder, Registry};
    use crate::{
        errors::SynthErrorKind,
        term::Value,
        ty::{Ty, TyCaps},
    };

    struct Mock;

    impl Introspect for Mock {
        fn ty(&self) -> Ty {
            Ty::con("Mock")
        }

        fn describe_operations(&self) -> Vec<Operation> {
            vec![
                Operation::constant("Method1", Value::Int(1)),
                Operation::constant("Method2", Value::Int(2)),
                Operation::constant("Method3", Value::Int(3)),
                Operation::instance("ToString", vec![], Ty::string(), |_| {
                    Ok(Value::Str(str!("mock")))
                }),
            ]
        }
    }

    struct WebClient;

    impl Introspect for WebClient {
        fn ty(&self) -> Ty {
            Ty::con("WebClient")
        }

        fn supertypes(&self) -> Vec<Ty> {
            vec![Ty::con("Component")]
        }

        fn describe_operations(&self) -> Vec<Operation> {
            vec![Operation::new("WebClient::new", vec![], self.ty(), |_| {
                Ok(Value::object("WebClient", vec![]))
            })]
        }
    }

    fn names(registry: &Registry, ty: &Ty) -> Vec<String> {
        registry
            .query_operations(ty)
            .iter()
            .map(|op| op.name().to_string())
            .collect()
    }

    #[test]
    fn test_register_type_with_criteria() {
        let mut registry = Registry::seeded(0);
        let criteria = Criteria::new(|op: &Operation| op.name() == "Method3");
        assert_eq!(registry.register_type_with(&Mock, &criteria).ok(), Some(1));
        assert_eq!(names(&registry, &Ty::int()), vec!["Method3"]);
        assert_eq!(registry.host_types(), &[Ty::con("Mock")]);
    }

    #[test]
    fn test_instance_operations_are_skipped() {
        let mut registry = Registry::seeded(0);
        assert_eq!(registry.register_type(&Mock).ok(), Some(3));
        assert!(!registry.has_type(&Ty::string()));

        let op = Operation::instance("len", vec![], Ty::long(), |_| Ok(Value::Long(0)));
        assert_eq!(registry.register_operation(op).ok(), Some(false));
        assert!(!registry.has_type(&Ty::long()));
    }

    #[test]
    fn test_duplicate_registration_is_ignored() {
        let mut registry = Registry::seeded(0);
        let op = Operation::constant("five", Value::Int(5));
        assert_eq!(registry.register_operation(op.clone()).ok(), Some(true));
        assert_eq!(registry.register_operation(op).ok(), Some(false));
        assert_eq!(registry.query_operations(&Ty::int()).len(), 1);
    }

    #[test]
    fn test_query_by_interface() {
        let mut registry = Registry::seeded(0);
        registry
            .register_operation(Operation::constant("five", Value::Int(5)))
            .unwrap();
        assert_eq!(registry.query_operations(&Ty::comparable()).len(), 1);
        assert_eq!(registry.query_operations(&Ty::numeric()).len(), 1);
        assert_eq!(registry.query_operations(&Ty::object()).len(), 1);
        assert!(registry.query_operations(&Ty::bool()).is_empty());
    }

    #[test]
    fn test_query_by_base_type() {
        let mut registry = Registry::seeded(0);
        registry.register_type(&WebClient).unwrap();
        assert_eq!(names(&registry, &Ty::con("Component")), vec!["WebClient::new"]);
    }

    #[test]
    fn test_late_supertype_reindexes() {
        let mut registry = Registry::seeded(0);
        registry
            .register_operation(Operation::new("WebClient::new", vec![], Ty::con("WebClient"), |_| {
                Ok(Value::object("WebClient", vec![]))
            }))
            .unwrap();
        assert!(!registry.has_type(&Ty::con("Component")));

        registry.register_type(&WebClient).unwrap();
        assert!(registry.is_assignable(&Ty::con("WebClient"), &Ty::con("Component")));
        assert_eq!(names(&registry, &Ty::con("Component")), vec!["WebClient::new"]);

        registry.declare_type(&Ty::con("Component"), &[Ty::con("Disposable")]);
        assert_eq!(names(&registry, &Ty::con("Disposable")), vec!["WebClient::new"]);
        assert_eq!(names(&registry, &Ty::con("WebClient")), vec!["WebClient::new"]);
    }

    #[test]
    fn test_pick_type_by_caps() {
        let mut registry = Registry::seeded(3);
        registry
            .register_operation(Operation::constant("five", Value::Int(5)))
            .unwrap();
        registry
            .register_operation(Operation::constant("yes", Value::Bool(true)))
            .unwrap();
        registry
            .register_operation(Operation::constant("hi", Value::Str(str!("hi"))))
            .unwrap();

        for _ in 0..20 {
            let ty = registry.pick_type(TyCaps::ORDERED).unwrap();
            assert!(ty == Ty::int() || ty == Ty::string(), "picked {}", ty);
            assert_eq!(registry.pick_type(TyCaps::BOOLEAN), Some(Ty::bool()));
        }
        assert!(registry.pick_type(TyCaps::empty()).is_some());

        registry.set_operation_weight("yes", 0.0).unwrap();
        assert_eq!(registry.pick_type(TyCaps::BOOLEAN), None);
        assert_eq!(Registry::seeded(0).pick_type(TyCaps::empty()), None);
    }

    #[test]
    fn test_register_module_with_criteria() {
        let module = Module::new("test").with_type(Mock).with_type(WebClient);
        let mut registry = Registry::seeded(0);
        let criteria = Criteria::<dyn Introspect>::new(|host| host.ty() == Ty::con("Mock"));
        assert_eq!(registry.register_module_with(&module, &criteria).ok(), Some(3));
        assert_eq!(registry.query_operations(&Ty::int()).len(), 3);
        assert!(!registry.has_type(&Ty::con("WebClient")));

        let mut registry = Registry::seeded(0);
        assert_eq!(registry.register_module(&module).ok(), Some(4));
    }

    #[test]
    fn test_weighted_order() {
        let mut registry = Registry::seeded(42);
        registry
            .register_operation_with_weight(Operation::constant("f", Value::Int(1)), 1e-5)
            .unwrap();
        registry
            .register_operation_with_weight(Operation::constant("g", Value::Int(2)), 1e8)
            .unwrap();

        for _ in 0..50 {
            assert_eq!(names(&registry, &Ty::int()), vec!["g", "f"]);
        }
    }

    #[test]
    fn test_set_operation_weight() {
        let mut registry = Registry::seeded(0).with_order(RegistrationOrder);
        registry.register_type(&Mock).unwrap();

        registry.set_operation_weight("Method2", 0.0).unwrap();
        assert_eq!(registry.operation_weight("Method2"), Some(0.0));
        assert_eq!(names(&registry, &Ty::int()), vec!["Method1", "Method3"]);

        let err = registry.set_operation_weight("Method1", -1.0).unwrap_err();
        assert_eq!(err.kind, SynthErrorKind::Config);
        assert_eq!(registry.operation_weight("Method1"), Some(1.0));

        assert!(registry.set_operation_weight("Missing", 1.0).is_err());
    }

    #[test]
    fn test_negative_registration_weight() {
        let mut registry = Registry::seeded(0);
        let op = Operation::constant("five", Value::Int(5));
        assert!(registry.register_operation_with_weight(op, -0.5).is_err());
        assert!(!registry.has_type(&Ty::int()));
    }
}
