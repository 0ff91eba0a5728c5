// ODM Core - OverDrive loan acquisition
// Copyright (C) 2025 ODM Core contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.


//! Early loan return

use crate::api::client::OverDriveClient;
use crate::error::{OdmError, Result};
use tracing::info;

impl OverDriveClient {
    /// Release a loan back to the lending service
    ///
    /// # Endpoint
    /// `GET {EarlyReturnURL}` with only `User-Agent`
    ///
    /// # Errors
    /// - `LoanReturn` - non-2xx response; usually the loan is already returned
    /// - `Http` - transport failure
    pub async fn return_loan(&self, return_url: &str) -> Result<()> {
        let response = self.get(return_url).await?;
        let status = response.status();

        if !status.is_success() {
            return Err(OdmError::LoanReturn {
                status: status.as_u16(),
            });
        }

        info!("loan returned");
        Ok(())
    }
}
