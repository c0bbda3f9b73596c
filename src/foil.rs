//! Airfoils.
//!
//! A [`Foil`] decoded through a [`FoilManager`] keeps the gateway it came
//! from and can act on its remote counterpart. Those operations are plain
//! methods and each performs exactly one remote call; the cached geometry
//! fields are only refreshed by fetching the foil again.

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::error::Error;
use crate::ipc::{GatewayExt, SharedGateway};
use crate::marshal::{deserialize, deserialize_with, serialize, DecodeError, FromWire, Shape, ToWire};
use crate::models::Coord;
use crate::wire::{WireMap, WireValue};

/// Decode `raw` as a live `T` bound to `gateway`.
pub(crate) fn decode_live<T: Shape>(
    gateway: &SharedGateway,
    method: &str,
    raw: &WireValue,
) -> Result<T, Error> {
    deserialize_with(raw, Some(gateway)).map_err(|source| Error::Decode {
        method: method.to_string(),
        source,
    })
}

/// Decode a wire array of live `T`s.
pub(crate) fn decode_live_list<T: Shape>(
    gateway: &SharedGateway,
    method: &str,
    raw: &WireValue,
) -> Result<Vec<T>, Error> {
    let decode_err = |source: DecodeError| Error::Decode {
        method: method.to_string(),
        source,
    };
    let items = raw
        .as_array()
        .ok_or_else(|| decode_err(DecodeError::TypeMismatch {
            expected: "array",
            found: raw.kind(),
        }))?;
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            deserialize_with(item, Some(gateway)).map_err(|e| decode_err(e.in_field(i.to_string())))
        })
        .collect()
}

/// Geometry targets for [`Foil::set_geom`]. A zero leaves that parameter
/// unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GeomChange {
    pub camber: f64,
    pub camber_x: f64,
    pub thickness: f64,
    pub thickness_x: f64,
}

/// An airfoil as known to the xflr5 project.
#[derive(Clone, Default)]
pub struct Foil {
    pub name: String,
    /// Maximum camber, as a fraction of chord.
    pub camber: f64,
    /// Chordwise position of maximum camber.
    pub camber_x: f64,
    /// Maximum thickness, as a fraction of chord.
    pub thickness: f64,
    pub thickness_x: f64,
    /// Number of contour points.
    pub n: i64,
    gateway: Option<SharedGateway>,
}

impl Foil {
    /// A detached foil carrying only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Whether this foil can reach the server.
    pub fn is_live(&self) -> bool {
        self.gateway.is_some()
    }

    fn gateway(&self) -> Result<&SharedGateway, Error> {
        self.gateway
            .as_ref()
            .ok_or_else(|| Error::Detached(self.name.clone()))
    }

    /// Fetch the contour points from the server (`getFoilCoords`).
    pub fn coords(&self) -> Result<Vec<Coord>, Error> {
        self.gateway()?
            .call("getFoilCoords", &[self.name.to_wire()])
    }

    /// Replace the contour points on the server (`setFoilCoords`).
    pub fn set_coords(&self, coords: &[Coord]) -> Result<(), Error> {
        self.gateway()?
            .call("setFoilCoords", &[self.name.to_wire(), coords.to_wire()])
    }

    /// Change camber and thickness. Non-zero targets are applied to this
    /// instance too.
    pub fn set_geom(&mut self, change: GeomChange) -> Result<(), Error> {
        let gateway = self.gateway()?.clone();
        gateway.call::<()>(
            "setGeom",
            &[
                self.name.to_wire(),
                change.camber.to_wire(),
                change.camber_x.to_wire(),
                change.thickness.to_wire(),
                change.thickness_x.to_wire(),
            ],
        )?;

        for (target, value) in [
            (&mut self.camber, change.camber),
            (&mut self.camber_x, change.camber_x),
            (&mut self.thickness, change.thickness),
            (&mut self.thickness_x, change.thickness_x),
        ] {
            if value != 0.0 {
                *target = value;
            }
        }
        Ok(())
    }

    /// Copy this foil under `to_name` and return the copy.
    pub fn duplicate(&self, to_name: &str) -> Result<Foil, Error> {
        let gateway = self.gateway()?;
        let raw = gateway.invoke("duplicateFoil", &[self.name.to_wire(), to_name.to_wire()])?;
        decode_live(gateway, "duplicateFoil", &raw)
    }

    /// Remove the foil from the project.
    pub fn delete(self) -> Result<(), Error> {
        self.gateway()?.call("deleteFoil", &[self.name.to_wire()])
    }

    /// Rename the foil, remotely first and then locally.
    pub fn rename(&mut self, new_name: &str) -> Result<(), Error> {
        self.gateway()?
            .call::<()>("renameFoil", &[self.name.to_wire(), new_name.to_wire()])?;
        debug!(from = %self.name, to = new_name, "Renamed foil");
        self.name = new_name.to_string();
        Ok(())
    }

    pub fn normalize(&self) -> Result<(), Error> {
        self.gateway()?.call("normalizeFoil", &[self.name.to_wire()])
    }

    pub fn derotate(&self) -> Result<(), Error> {
        self.gateway()?.call("derotateFoil", &[self.name.to_wire()])
    }
}

impl fmt::Debug for Foil {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Foil")
            .field("name", &self.name)
            .field("camber", &self.camber)
            .field("camber_x", &self.camber_x)
            .field("thickness", &self.thickness)
            .field("thickness_x", &self.thickness_x)
            .field("n", &self.n)
            .field("live", &self.is_live())
            .finish()
    }
}

/// Compares the cached fields only.
impl PartialEq for Foil {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.camber == other.camber
            && self.camber_x == other.camber_x
            && self.thickness == other.thickness
            && self.thickness_x == other.thickness_x
            && self.n == other.n
    }
}

impl Shape for Foil {
    fn template(gateway: Option<&SharedGateway>) -> Self {
        Self {
            gateway: gateway.cloned(),
            ..Self::default()
        }
    }

    fn assign(&mut self, key: &str, value: &WireValue) -> Result<bool, DecodeError> {
        match key {
            "name" => self.name = String::from_wire(value)?,
            "camber" => self.camber = f64::from_wire(value)?,
            "camber_x" => self.camber_x = f64::from_wire(value)?,
            "thickness" => self.thickness = f64::from_wire(value)?,
            "thickness_x" => self.thickness_x = f64::from_wire(value)?,
            "n" => self.n = i64::from_wire(value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn fields(&self) -> WireMap {
        let mut map = WireMap::new();
        map.insert("name".to_string(), self.name.to_wire());
        map.insert("camber".to_string(), self.camber.to_wire());
        map.insert("camber_x".to_string(), self.camber_x.to_wire());
        map.insert("thickness".to_string(), self.thickness.to_wire());
        map.insert("thickness_x".to_string(), self.thickness_x.to_wire());
        map.insert("n".to_string(), self.n.to_wire());
        map
    }
}

impl ToWire for Foil {
    fn to_wire(&self) -> WireValue {
        serialize(self)
    }
}

/// Decodes a detached foil.
impl FromWire for Foil {
    fn from_wire(value: &WireValue) -> Result<Self, DecodeError> {
        deserialize(value)
    }
}

/// Lookup and bulk operations on the project's airfoils.
#[derive(Clone)]
pub struct FoilManager {
    gateway: SharedGateway,
}

impl FoilManager {
    pub fn new(gateway: SharedGateway) -> Self {
        Self { gateway }
    }

    /// Fetch a live foil by name. An empty name returns the current foil.
    ///
    /// # Errors
    ///
    /// `Error::NotFound` if the server answers with a different foil, which
    /// is what it does for unknown names.
    pub fn get_foil(&self, name: &str) -> Result<Foil, Error> {
        let raw = self.gateway.invoke("getFoil", &[name.to_wire()])?;
        let foil: Foil = decode_live(&self.gateway, "getFoil", &raw)?;
        if !name.is_empty() && foil.name != name {
            return Err(Error::NotFound {
                kind: "foil",
                name: name.to_string(),
            });
        }
        Ok(foil)
    }

    pub fn foil_exists(&self, name: &str) -> Result<bool, Error> {
        self.gateway.call("foilExists", &[name.to_wire()])
    }

    /// Every foil in the project, in server order.
    pub fn foils(&self) -> Result<Vec<Foil>, Error> {
        let raw = self.gateway.invoke("foilList", &[])?;
        decode_live_list(&self.gateway, "foilList", &raw)
    }

    /// Every foil in the project, keyed by name.
    pub fn foil_map(&self) -> Result<BTreeMap<String, Foil>, Error> {
        Ok(self
            .foils()?
            .into_iter()
            .map(|foil| (foil.name.clone(), foil))
            .collect())
    }

    /// Load `.dat` files into the project.
    pub fn load_foils<S: AsRef<str>>(&self, paths: &[S]) -> Result<(), Error> {
        if paths.is_empty() {
            return Err(Error::InvalidArgument("no foil files given".to_string()));
        }
        if let Some(bad) = paths.iter().find(|p| !p.as_ref().ends_with(".dat")) {
            return Err(Error::InvalidArgument(format!(
                "`{}` is not a .dat file",
                bad.as_ref()
            )));
        }
        let paths: Vec<&str> = paths.iter().map(AsRef::as_ref).collect();
        self.gateway.call("loadFoils", &[paths.to_wire()])
    }

    /// Write `name` to `file_name` (a full path) in .dat format.
    pub fn export_foil(&self, name: &str, file_name: &str) -> Result<(), Error> {
        self.gateway
            .call("exportFoil", &[name.to_wire(), file_name.to_wire()])
    }

    /// Make `name` the current foil, optionally selecting it in the GUI.
    pub fn set_cur_foil(&self, name: &str, select: bool) -> Result<(), Error> {
        self.gateway
            .call("setCurFoil", &[name.to_wire(), select.to_wire()])
    }
}
