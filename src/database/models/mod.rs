pub mod banner;
pub mod city;
pub mod distributor;
pub mod district;
pub mod doctor;
pub mod order;
pub mod patient;
pub mod prescription;
pub mod product;
pub mod team;
pub mod user;

pub use banner::{Banner, BannerInput};
pub use city::{City, CityInput};
pub use distributor::{Distributor, DistributorInput};
pub use district::{District, DistrictInput};
pub use doctor::{Doctor, DoctorInput};
pub use order::{Order, OrderImport};
pub use patient::{Patient, PatientInput};
pub use prescription::{Prescription, PrescriptionInput};
pub use product::{Product, ProductInput};
pub use team::{Team, TeamInput};
pub use user::{User, UserInput};

use serde::{Deserialize, Deserializer};

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`)
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn null_clears_while_absent_keeps() {
        let cleared: CityInput = serde_json::from_value(json!({"distributor_id": null})).unwrap();
        assert_eq!(cleared.distributor_id, Some(None));

        let untouched: CityInput = serde_json::from_value(json!({"name": "Multan"})).unwrap();
        assert_eq!(untouched.distributor_id, None);

        let id = Uuid::new_v4();
        let set: CityInput = serde_json::from_value(json!({"distributor_id": id})).unwrap();
        assert_eq!(set.distributor_id, Some(Some(id)));
    }
}
