use embedded_sdmmc::{
    BlockDevice, Directory, File, Mode, TimeSource, Timestamp, Volume, VolumeIdx, VolumeManager,
};

use crate::hw::Storage;

#[derive(Debug)]
pub enum SdError<E: core::fmt::Debug> {
    Card(embedded_sdmmc::Error<E>),
    // Write or close without a matching open
    NotOpen,
}

impl<E: core::fmt::Debug> From<embedded_sdmmc::Error<E>> for SdError<E> {
    fn from(err: embedded_sdmmc::Error<E>) -> Self {
        SdError::Card(err)
    }
}

// No RTC on the board, every file carries the same timestamp
pub struct FixedTimeSource;

impl TimeSource for FixedTimeSource {
    fn get_timestamp(&self) -> Timestamp {
        Timestamp {
            year_since_1970: 55,
            zero_indexed_month: 0,
            zero_indexed_day: 0,
            hours: 0,
            minutes: 0,
            seconds: 0,
        }
    }
}

pub struct SdStorage<D, T>
where
    D: BlockDevice,
    T: TimeSource,
{
    volume_mgr: VolumeManager<D, T>,
    volume: Volume,
    root_dir: Directory,
    file: Option<File>,
    name: &'static str,
}

impl<D, T> SdStorage<D, T>
where
    D: BlockDevice,
    D::Error: core::fmt::Debug,
    T: TimeSource,
{
    pub fn mount(device: D, time_source: T, name: &'static str) -> Result<Self, SdError<D::Error>> {
        let mut volume_mgr = VolumeManager::new(device, time_source);
        let volume = volume_mgr.get_volume(VolumeIdx(0))?;
        let root_dir = volume_mgr.open_root_dir(&volume)?;
        info!("volume mounted, logging to {}", name);
        Ok(SdStorage {
            volume_mgr,
            volume,
            root_dir,
            file: None,
            name,
        })
    }
}

impl<D, T> Storage for SdStorage<D, T>
where
    D: BlockDevice,
    D::Error: core::fmt::Debug,
    T: TimeSource,
{
    type Error = SdError<D::Error>;

    fn open_append(&mut self) -> Result<(), Self::Error> {
        let file = self.volume_mgr.open_file_in_dir(
            &mut self.volume,
            &self.root_dir,
            self.name,
            Mode::ReadWriteCreateOrAppend,
        )?;
        self.file = Some(file);
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        let file = self.file.as_mut().ok_or(SdError::NotOpen)?;
        self.volume_mgr.write(&mut self.volume, file, bytes)?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Self::Error> {
        let file = self.file.take().ok_or(SdError::NotOpen)?;
        self.volume_mgr.close_file(&self.volume, file)?;
        Ok(())
    }
}
