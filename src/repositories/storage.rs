use crate::clients::BackendClient;
use crate::error::AppResult;
use crate::models::FileBlob;

/// 文件存储
#[allow(async_fn_in_trait)]
pub trait ObjectStore {
    /// 上传对象，返回公开访问地址
    async fn put_object(&self, bucket: &str, path: &str, blob: &FileBlob) -> AppResult<String>;

    /// 删除对象
    async fn remove(&self, bucket: &str, paths: &[String]) -> AppResult<()>;
}

impl ObjectStore for BackendClient {
    async fn put_object(&self, bucket: &str, path: &str, blob: &FileBlob) -> AppResult<String> {
        let stored = self.upload_object(bucket, path, blob).await?;
        Ok(self.public_url(bucket, &stored))
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> AppResult<()> {
        self.remove_objects(bucket, paths).await
    }
}
