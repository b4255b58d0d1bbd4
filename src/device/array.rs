//! Grid of devices driven as a single surface

use async_trait::async_trait;
use futures::future::join_all;
use serde_derive::{Deserialize, Serialize};
use strum_macros::{EnumString, IntoStaticStr};
use thiserror::Error;

use super::{DeviceClient, DeviceError, LedMode, Response, Xled};
use crate::{
    color::Color,
    frame::{PixelFrame, Rotation},
    models,
};

#[derive(Debug, Error)]
pub enum ArrayError {
    #[error("device grid is empty")]
    Empty,
    #[error("column {column} has {found} devices, expected {expected}")]
    Ragged {
        column: usize,
        expected: usize,
        found: usize,
    },
    #[error("unknown device: {0}")]
    UnknownDevice(String),
    #[error(transparent)]
    Device(#[from] DeviceError),
}

/// Physical corner of the grid that maps to the logical `(0, 0)`
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeviceOrigin {
    /// Portrait, upright
    TopLeft,
    /// Landscape, turned right
    TopRight,
    /// Landscape, turned left
    BottomLeft,
    /// Portrait, upside down
    BottomRight,
}

impl DeviceOrigin {
    pub fn is_portrait(self) -> bool {
        matches!(self, Self::TopLeft | Self::BottomRight)
    }

    pub fn is_landscape(self) -> bool {
        !self.is_portrait()
    }

    /// Rotation turning the physical grid into its logical layout
    pub fn grid_rotation(self) -> Rotation {
        match self {
            Self::TopLeft => Rotation::None,
            Self::TopRight => Rotation::Right,
            Self::BottomLeft => Rotation::Left,
            Self::BottomRight => Rotation::Full,
        }
    }

    /// Rotation turning a logical sub-frame into the device's own coordinates
    pub fn frame_rotation(self) -> Rotation {
        self.grid_rotation().inverse()
    }

    /// Size covered by a `width` x `height` device in the logical frame
    pub fn footprint(self, width: usize, height: usize) -> (usize, usize) {
        if self.is_portrait() {
            (width, height)
        } else {
            (height, width)
        }
    }
}

impl Default for DeviceOrigin {
    fn default() -> Self {
        Self::TopLeft
    }
}

/// Rotate a column-major grid, `grid[x][y]`, the same way frames are rotated
fn rotate_grid<T: Copy>(grid: &[Vec<T>], rotation: Rotation) -> Vec<Vec<T>> {
    let width = grid.len();
    let height = grid.first().map(Vec::len).unwrap_or(0);

    let (new_width, new_height) = match rotation {
        Rotation::None | Rotation::Full => (width, height),
        Rotation::Left | Rotation::Right => (height, width),
    };

    let mut rotated: Vec<Vec<Option<T>>> = vec![vec![None; new_height]; new_width];
    for (x, column) in grid.iter().enumerate() {
        for (y, &cell) in column.iter().enumerate() {
            let (nx, ny) = match rotation {
                Rotation::None => (x, y),
                Rotation::Left => (y, width - 1 - x),
                Rotation::Right => (height - 1 - y, x),
                Rotation::Full => (width - 1 - x, height - 1 - y),
            };

            rotated[nx][ny] = Some(cell);
        }
    }

    rotated
        .into_iter()
        .map(|column| column.into_iter().flatten().collect())
        .collect()
}

/// Devices arranged in columns, addressed as one frame
pub struct DeviceArray<D> {
    origin: DeviceOrigin,
    /// `columns[column][row]`, in physical order
    columns: Vec<Vec<D>>,
    width: usize,
    height: usize,
}

impl DeviceArray<DeviceClient> {
    /// Build the clients of a configured array
    pub fn from_config(
        array: &models::ArrayConfig,
        config: &models::Config,
    ) -> Result<Self, ArrayError> {
        let columns = array
            .columns
            .iter()
            .map(|column| {
                column
                    .iter()
                    .map(|name| {
                        let device = config
                            .devices
                            .get(name)
                            .ok_or_else(|| ArrayError::UnknownDevice(name.clone()))?;
                        Ok(DeviceClient::from_config(name, device, config)?)
                    })
                    .collect::<Result<Vec<_>, ArrayError>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(columns, array.origin)
    }

    /// Connect every device of the grid, returns `true` if all of them answered
    pub async fn connect(&mut self) -> bool {
        join_all(self.devices_mut().map(DeviceClient::connect))
            .await
            .into_iter()
            .all(|connected| connected)
    }
}

impl<D: Xled> DeviceArray<D> {
    pub fn new(columns: Vec<Vec<D>>, origin: DeviceOrigin) -> Result<Self, ArrayError> {
        let expected = match columns.first() {
            Some(column) if !column.is_empty() => column.len(),
            _ => return Err(ArrayError::Empty),
        };

        if let Some((column, found)) = columns
            .iter()
            .map(Vec::len)
            .enumerate()
            .find(|&(_, len)| len != expected)
        {
            return Err(ArrayError::Ragged {
                column,
                expected,
                found,
            });
        }

        let mut array = Self {
            origin,
            columns,
            width: 0,
            height: 0,
        };
        array.update_size();

        Ok(array)
    }

    pub fn origin(&self) -> DeviceOrigin {
        self.origin
    }

    pub fn columns(&self) -> usize {
        self.columns.len()
    }

    pub fn rows(&self) -> usize {
        self.columns[0].len()
    }

    pub fn get(&self, column: usize, row: usize) -> Option<&D> {
        self.columns.get(column)?.get(row)
    }

    pub fn devices(&self) -> impl Iterator<Item = &D> {
        self.columns.iter().flatten()
    }

    pub fn devices_mut(&mut self) -> impl Iterator<Item = &mut D> {
        self.columns.iter_mut().flatten()
    }

    /// Swap the device of a cell, returning the previous one
    pub fn replace(&mut self, column: usize, row: usize, device: D) -> Option<D> {
        let cell = self.columns.get_mut(column)?.get_mut(row)?;
        let previous = std::mem::replace(cell, device);
        self.update_size();
        Some(previous)
    }

    /// Grid of physical `(column, row)` indices in logical order
    fn logical_grid(&self) -> Vec<Vec<(usize, usize)>> {
        let indices: Vec<Vec<_>> = (0..self.columns())
            .map(|column| (0..self.rows()).map(|row| (column, row)).collect())
            .collect();

        rotate_grid(&indices, self.origin.grid_rotation())
    }

    fn footprint(&self, (column, row): (usize, usize)) -> (usize, usize) {
        let device = &self.columns[column][row];
        self.origin.footprint(device.width(), device.height())
    }

    fn update_size(&mut self) {
        let grid = self.logical_grid();
        let rows = grid.first().map(Vec::len).unwrap_or(0);

        self.width = (0..rows)
            .map(|row| grid.iter().map(|column| self.footprint(column[row]).0).sum())
            .max()
            .unwrap_or(0);

        self.height = grid
            .iter()
            .map(|column| column.iter().map(|&cell| self.footprint(cell).1).sum())
            .max()
            .unwrap_or(0);
    }

    /// Cut `frame` into the frames of every device, in physical order
    ///
    /// Devices whose area starts outside of `frame` get `None`.
    pub fn split_frame(&self, frame: &PixelFrame) -> Vec<Vec<Option<PixelFrame>>> {
        let rotation = self.origin.frame_rotation();
        let mut frames = vec![vec![None; self.rows()]; self.columns()];

        let mut offset_x = 0;
        for column in self.logical_grid() {
            let mut offset_y = 0;
            let mut column_width = 0;

            for cell in column {
                let (width, height) = self.footprint(cell);

                if offset_x < frame.width() && offset_y < frame.height() {
                    let sub_frame =
                        frame.sub_frame(offset_x as i32, offset_y as i32, width, height);
                    frames[cell.0][cell.1] = Some(sub_frame.rotate(rotation));
                } else {
                    trace!(column = cell.0, row = cell.1, "device outside of frame");
                }

                offset_y += height;
                column_width = column_width.max(width);
            }

            offset_x += column_width;
        }

        frames
    }

    /// Device used to answer queries
    fn master(&mut self) -> &mut D {
        let index = self
            .devices()
            .position(Xled::is_sync_master)
            .unwrap_or(0);
        let rows = self.rows();

        &mut self.columns[index / rows][index % rows]
    }
}

/// Reduce the answers of all devices, `None` if any of them failed
fn collect_responses(responses: Vec<Option<Response>>) -> Option<Response> {
    let responses = responses.into_iter().collect::<Option<Vec<_>>>()?;

    responses
        .iter()
        .find(|response| !response.code.is_ok())
        .or_else(|| responses.first())
        .copied()
}

#[async_trait]
impl<D: Xled> Xled for DeviceArray<D> {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    async fn login(&mut self) -> bool {
        join_all(self.devices_mut().map(|device| device.login()))
            .await
            .into_iter()
            .all(|logged_in| logged_in)
    }

    fn is_logged_in(&self) -> bool {
        self.devices().all(Xled::is_logged_in)
    }

    async fn logout(&mut self) {
        join_all(self.devices_mut().map(|device| device.logout())).await;
    }

    async fn status(&mut self) -> Option<Response> {
        self.master().status().await
    }

    async fn led_mode(&mut self) -> Option<LedMode> {
        self.master().led_mode().await
    }

    async fn set_led_mode(&mut self, mode: LedMode) -> Option<Response> {
        collect_responses(join_all(self.devices_mut().map(|device| device.set_led_mode(mode))).await)
    }

    async fn brightness(&mut self) -> Option<f64> {
        self.master().brightness().await
    }

    async fn set_brightness(&mut self, brightness: f64) -> Option<Response> {
        collect_responses(
            join_all(
                self.devices_mut()
                    .map(|device| device.set_brightness(brightness)),
            )
            .await,
        )
    }

    async fn saturation(&mut self) -> Option<f64> {
        self.master().saturation().await
    }

    async fn set_saturation(&mut self, saturation: f64) -> Option<Response> {
        collect_responses(
            join_all(
                self.devices_mut()
                    .map(|device| device.set_saturation(saturation)),
            )
            .await,
        )
    }

    async fn color(&mut self) -> Option<Color> {
        self.master().color().await
    }

    async fn set_color(&mut self, color: Color) -> Option<Response> {
        collect_responses(join_all(self.devices_mut().map(|device| device.set_color(color))).await)
    }

    async fn show_real_time_frame(&mut self, frame: &PixelFrame) {
        let frames = self.split_frame(frame);

        let sends = self
            .columns
            .iter_mut()
            .zip(frames.iter())
            .flat_map(|(devices, frames)| devices.iter_mut().zip(frames.iter()))
            .filter_map(|(device, frame)| {
                frame
                    .as_ref()
                    .map(move |frame| device.show_real_time_frame(frame))
            });

        join_all(sends).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{color::Rgb, device::fake::FakeXled};

    fn grid(columns: usize, rows: usize, width: usize, height: usize) -> Vec<Vec<FakeXled>> {
        (0..columns)
            .map(|_| (0..rows).map(|_| FakeXled::new(width, height)).collect())
            .collect()
    }

    /// Frame whose pixels encode their own coordinates
    fn coordinates(width: usize, height: usize) -> PixelFrame {
        let mut frame = PixelFrame::new(width, height, Color::BLACK);
        for y in 0..height {
            for x in 0..width {
                frame.set(x as i32, y as i32, Rgb::new(x as u8, y as u8, 1));
            }
        }
        frame
    }

    #[test]
    fn test_invalid_grids() {
        assert!(matches!(
            DeviceArray::<FakeXled>::new(vec![], DeviceOrigin::TopLeft),
            Err(ArrayError::Empty)
        ));
        assert!(matches!(
            DeviceArray::<FakeXled>::new(vec![vec![]], DeviceOrigin::TopLeft),
            Err(ArrayError::Empty)
        ));

        let mut devices = grid(2, 2, 10, 21);
        devices[1].pop();
        assert!(matches!(
            DeviceArray::new(devices, DeviceOrigin::TopLeft),
            Err(ArrayError::Ragged {
                column: 1,
                expected: 2,
                found: 1
            })
        ));
    }

    #[test]
    fn test_size() {
        let array = DeviceArray::new(grid(2, 2, 10, 21), DeviceOrigin::TopLeft).unwrap();
        assert_eq!((array.width(), array.height()), (20, 42));

        let array = DeviceArray::new(grid(2, 1, 10, 21), DeviceOrigin::BottomRight).unwrap();
        assert_eq!((array.width(), array.height()), (20, 21));

        // Landscape arrays turn both the grid and the devices
        let array = DeviceArray::new(grid(2, 1, 10, 21), DeviceOrigin::TopRight).unwrap();
        assert_eq!((array.width(), array.height()), (21, 20));
    }

    #[test]
    fn test_replace_updates_size() {
        let mut array = DeviceArray::new(grid(2, 1, 10, 21), DeviceOrigin::TopLeft).unwrap();
        let previous = array.replace(1, 0, FakeXled::new(5, 30)).unwrap();

        assert_eq!(previous.width(), 10);
        assert_eq!((array.width(), array.height()), (15, 30));
        assert!(array.replace(2, 0, FakeXled::new(5, 30)).is_none());
    }

    #[test]
    fn test_rotate_grid() {
        let grid = vec![vec![1, 2], vec![3, 4], vec![5, 6]];

        assert_eq!(rotate_grid(&grid, Rotation::None), grid);
        assert_eq!(
            rotate_grid(&grid, Rotation::Full),
            vec![vec![6, 5], vec![4, 3], vec![2, 1]]
        );
        assert_eq!(
            rotate_grid(&rotate_grid(&grid, Rotation::Left), Rotation::Right),
            grid
        );
        assert_eq!(rotate_grid(&grid, Rotation::Right).len(), 2);
    }

    #[tokio::test]
    async fn test_top_left_solid() {
        let devices = grid(2, 1, 10, 21);
        let (a, b) = (devices[0][0].clone(), devices[1][0].clone());
        let mut array = DeviceArray::new(devices, DeviceOrigin::TopLeft).unwrap();

        let red = PixelFrame::new(20, 21, Rgb::new(255, 0, 0));
        array.show_real_time_frame(&red).await;

        let expected = PixelFrame::new(10, 21, Rgb::new(255, 0, 0));
        assert_eq!(a.frames(), vec![expected.clone()]);
        assert_eq!(b.frames(), vec![expected]);
    }

    #[tokio::test]
    async fn test_top_left_assignment() {
        let devices = grid(2, 1, 10, 21);
        let (a, b) = (devices[0][0].clone(), devices[1][0].clone());
        let mut array = DeviceArray::new(devices, DeviceOrigin::TopLeft).unwrap();

        let frame = coordinates(20, 21);
        array.show_real_time_frame(&frame).await;

        assert_eq!(a.frames(), vec![frame.sub_frame(0, 0, 10, 21)]);
        assert_eq!(b.frames(), vec![frame.sub_frame(10, 0, 10, 21)]);
    }

    #[tokio::test]
    async fn test_bottom_right_mirrors() {
        let devices = grid(2, 1, 10, 21);
        let (a, b) = (devices[0][0].clone(), devices[1][0].clone());
        let mut array = DeviceArray::new(devices, DeviceOrigin::BottomRight).unwrap();

        let frame = coordinates(20, 21);
        array.show_real_time_frame(&frame).await;

        assert_eq!(a.frames(), vec![frame.sub_frame(10, 0, 10, 21).rotate_180()]);
        assert_eq!(b.frames(), vec![frame.sub_frame(0, 0, 10, 21).rotate_180()]);
    }

    #[tokio::test]
    async fn test_landscape_rotates_devices() {
        let devices = grid(1, 1, 10, 21);
        let device = devices[0][0].clone();
        let mut array = DeviceArray::new(devices, DeviceOrigin::TopRight).unwrap();
        assert_eq!((array.width(), array.height()), (21, 10));

        let frame = coordinates(21, 10);
        array.show_real_time_frame(&frame).await;

        let sent = device.frames();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].dimensions(), (10, 21));
        assert_eq!(sent[0], frame.rotate_left());
    }

    #[tokio::test]
    async fn test_skips_devices_outside_frame() {
        let devices = grid(2, 1, 10, 21);
        let (a, b) = (devices[0][0].clone(), devices[1][0].clone());
        let mut array = DeviceArray::new(devices, DeviceOrigin::TopLeft).unwrap();

        array
            .show_real_time_frame(&PixelFrame::new(10, 21, Rgb::WHITE))
            .await;

        assert_eq!(a.frames().len(), 1);
        assert!(b.frames().is_empty());
    }

    #[tokio::test]
    async fn test_queries_go_to_master() {
        let mut devices = grid(2, 1, 10, 21);
        devices[1][0] = FakeXled::new(10, 21).master();
        devices[0][0].state.lock().unwrap().brightness = 0.2;
        devices[1][0].state.lock().unwrap().brightness = 0.8;
        let mut array = DeviceArray::new(devices, DeviceOrigin::TopLeft).unwrap();

        assert_eq!(array.brightness().await, Some(0.8));
    }

    #[tokio::test]
    async fn test_setters_fan_out() {
        let devices = grid(2, 1, 10, 21);
        let (a, b) = (devices[0][0].clone(), devices[1][0].clone());
        let mut array = DeviceArray::new(devices, DeviceOrigin::TopLeft).unwrap();

        assert!(array.set_led_mode(LedMode::Rt).await.is_some());
        assert_eq!(a.modes(), vec![LedMode::Rt]);
        assert_eq!(b.modes(), vec![LedMode::Rt]);

        b.state.lock().unwrap().offline = true;
        assert!(array.set_brightness(0.5).await.is_none());
        assert_eq!(a.state.lock().unwrap().brightness, 0.5);

        assert!(!array.login().await);
    }
}
