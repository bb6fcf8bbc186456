//! Presentation adapter
//!
//! [`BusScheduleViewModel`] exposes the schedule queries to a consuming view.
//! View models are created through a [`ViewModelFactory`] and kept in a
//! [`ViewModelStore`] that lives exactly as long as the view that owns it.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::sync::Arc;
use crate::dao::{ScheduleDao, ScheduleFlow};
use crate::{Error, Result};

/// Marker for objects a [`ViewModelStore`] can hold
pub trait ViewModel: Any + Send + Sync {}

/// Builds view models on behalf of a [`ViewModelStore`]
pub trait ViewModelFactory {
    /// A new `T`, or [`Error::UnsupportedViewModel`] if this factory cannot build it
    fn create<T: ViewModel>(&self) -> Result<T>;
}

pub struct BusScheduleViewModel {
    schedule_dao: ScheduleDao,
}

impl BusScheduleViewModel {
    pub fn new(schedule_dao: ScheduleDao) -> Self {
        Self { schedule_dao }
    }

    pub fn full_schedule(&self) -> ScheduleFlow {
        self.schedule_dao.get_all()
    }

    pub fn schedule_for_stop_name(&self, name: &str) -> ScheduleFlow {
        self.schedule_dao.get_by_stop_name(name)
    }
}

impl ViewModel for BusScheduleViewModel {}

pub struct BusScheduleViewModelFactory {
    schedule_dao: ScheduleDao,
}

impl BusScheduleViewModelFactory {
    pub fn new(schedule_dao: ScheduleDao) -> Self {
        Self { schedule_dao }
    }
}

impl ViewModelFactory for BusScheduleViewModelFactory {
    fn create<T: ViewModel>(&self) -> Result<T> {
        if TypeId::of::<T>() != TypeId::of::<BusScheduleViewModel>() {
            return Err(Error::UnsupportedViewModel(type_name::<T>().to_string()));
        }

        let model: Box<dyn Any> = Box::new(BusScheduleViewModel::new(self.schedule_dao.clone()));
        model
            .downcast::<T>()
            .map(|model| *model)
            .map_err(|_| Error::UnsupportedViewModel(type_name::<T>().to_string()))
    }
}

/// Per-scope cache holding at most one view model of each type
#[derive(Default)]
pub struct ViewModelStore {
    models: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl ViewModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached `T`, creating it with `factory` on first request
    pub fn get<T: ViewModel, F: ViewModelFactory>(&mut self, factory: &F) -> Result<Arc<T>> {
        if let Some(existing) = self.models.get(&TypeId::of::<T>()) {
            if let Ok(model) = Arc::clone(existing).downcast::<T>() {
                return Ok(model);
            }
        }

        let model = Arc::new(factory.create::<T>()?);
        tracing::debug!("Created view model {}", type_name::<T>());
        self.models.insert(TypeId::of::<T>(), model.clone());
        Ok(model)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Drop every view model; called when the owning scope ends
    pub fn clear(&mut self) {
        if !self.models.is_empty() {
            tracing::debug!("Clearing {} view model(s)", self.models.len());
        }
        self.models.clear();
    }
}

impl Drop for ViewModelStore {
    fn drop(&mut self) {
        self.clear();
    }
}
