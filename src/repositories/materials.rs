use crate::clients::{eq_filter, BackendClient};
use crate::error::AppResult;
use crate::models::{FileBlob, Material, MaterialUpload, NewMaterial};
use crate::repositories::storage::ObjectStore;
use tracing::warn;

/// 资料文件存储桶
pub const MATERIALS_BUCKET: &str = "materials_files";
/// 缩略图存储桶
pub const THUMBNAILS_BUCKET: &str = "thumbnails";

const TABLE: &str = "materials";

/// 学习资料仓储
#[allow(async_fn_in_trait)]
pub trait MaterialRepository {
    async fn list_by_unit(&self, unit_id: &str) -> AppResult<Vec<Material>>;

    /// 上传文件（及缩略图）并写入资料记录
    async fn upload_material(&self, upload: &MaterialUpload) -> AppResult<Material>;

    /// 删除存储中的文件后删除记录
    async fn remove_material(&self, material: &Material) -> AppResult<()>;
}

/// 存储对象路径：`<unit_id>/<uuid>.<ext>`
pub fn object_path(unit_id: &str, blob: &FileBlob) -> String {
    let id = uuid::Uuid::new_v4();
    match blob.extension() {
        Some(ext) => format!("{}/{}.{}", unit_id, id, ext),
        None => format!("{}/{}", unit_id, id),
    }
}

/// 写入 materials 表
#[allow(async_fn_in_trait)]
pub trait MaterialRows {
    async fn insert_material(&self, row: &NewMaterial) -> AppResult<Material>;
}

impl MaterialRows for BackendClient {
    async fn insert_material(&self, row: &NewMaterial) -> AppResult<Material> {
        self.insert(TABLE, row).await
    }
}

/// 上传文件（及缩略图）后写入记录
///
/// 缩略图上传失败只记录警告；记录写入失败时删除已上传的对象
pub async fn store_material<G>(gateway: &G, upload: &MaterialUpload) -> AppResult<Material>
where
    G: ObjectStore + MaterialRows,
{
    let file_path = object_path(&upload.unit_id, &upload.file);
    gateway
        .put_object(MATERIALS_BUCKET, &file_path, &upload.file)
        .await?;

    let thumbnail_path = match &upload.thumbnail {
        Some(thumb) => {
            let path = object_path(&upload.unit_id, thumb);
            match gateway.put_object(THUMBNAILS_BUCKET, &path, thumb).await {
                Ok(_) => Some(path),
                Err(e) => {
                    warn!("⚠️ 缩略图上传失败: {}", e);
                    None
                }
            }
        }
        None => None,
    };

    let row = NewMaterial {
        title: upload.title.clone(),
        description: upload.description.clone(),
        unit_id: upload.unit_id.clone(),
        file_path: file_path.clone(),
        thumbnail_path: thumbnail_path.clone(),
        mime_type: upload.file.content_type.clone(),
        size_bytes: upload.file.size(),
    };

    match gateway.insert_material(&row).await {
        Ok(material) => Ok(material),
        Err(e) => {
            if let Err(cleanup) = gateway.remove(MATERIALS_BUCKET, &[file_path]).await {
                warn!("⚠️ 清理资料文件失败: {}", cleanup);
            }
            if let Some(thumb) = thumbnail_path {
                if let Err(cleanup) = gateway.remove(THUMBNAILS_BUCKET, &[thumb]).await {
                    warn!("⚠️ 清理缩略图失败: {}", cleanup);
                }
            }
            Err(e)
        }
    }
}

impl MaterialRepository for BackendClient {
    async fn list_by_unit(&self, unit_id: &str) -> AppResult<Vec<Material>> {
        self.select(TABLE, &[eq_filter("unit_id", unit_id)], Some("title.asc"))
            .await
    }

    async fn upload_material(&self, upload: &MaterialUpload) -> AppResult<Material> {
        store_material(self, upload).await
    }

    async fn remove_material(&self, material: &Material) -> AppResult<()> {
        self.remove(MATERIALS_BUCKET, &[material.file_path.clone()])
            .await?;
        if let Some(thumb) = &material.thumbnail_path {
            self.remove(THUMBNAILS_BUCKET, &[thumb.clone()]).await?;
        }
        self.delete(TABLE, &[eq_filter("id", &material.id)]).await
    }
}
